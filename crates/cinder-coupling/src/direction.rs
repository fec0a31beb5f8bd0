//! Corrected momentum direction from the anisotropic weight sums.

use cinder_core::KernelWeights;

use crate::MIN_WEIGHT;

/// Compute the corrected momentum direction and its norm for one
/// neighbor's contribution, given the source's completed directional
/// weight sums.
///
/// Per axis, the neighbor's signed contribution is rescaled by the
/// imbalance between the positive- and negative-side totals, so that
/// opposing hemispheres receive momentum in proportion to how much of
/// the source's sky they actually cover. When one hemisphere is empty
/// the raw contribution passes through unmodified. The returned vector
/// points from the source toward the neighbor; its norm is the
/// neighbor's share of the total coupling budget.
pub fn corrected_direction(
    sums: &KernelWeights,
    contribution: &KernelWeights,
) -> ([f64; 3], f64) {
    let wk_norm = 1.0 / (MIN_WEIGHT + sums.scalar().abs());
    let mut direction = [0.0; 3];
    let mut norm_squared = 0.0;
    for axis in 0..3 {
        let total_pos = sums.axis_positive(axis).abs();
        let total_neg = sums.axis_negative(axis).abs();
        let c_pos = contribution.axis_positive(axis);
        let c_neg = contribution.axis_negative(axis);
        let mut q = 0.0;
        if total_pos > MIN_WEIGHT && total_neg > MIN_WEIGHT {
            let rr = total_neg / total_pos;
            let rr2 = rr * rr;
            if c_pos != 0.0 {
                q += wk_norm * c_pos * (0.5 * (1.0 + rr2)).sqrt();
            } else {
                q += wk_norm * c_neg * (0.5 * (1.0 + 1.0 / rr2)).sqrt();
            }
        } else {
            q += wk_norm * (c_pos + c_neg);
        }
        direction[axis] = -q;
        norm_squared += q * q;
    }
    (direction, norm_squared.sqrt())
}
