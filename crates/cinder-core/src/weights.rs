//! The directional weight accumulator carried by each feedback source.
//!
//! Eleven components: one scalar overlap term, three signed axis pairs
//! (six slots), and four auxiliary terms used by the energy-aware boost
//! correction. The split-by-sign axis storage is what makes the weight
//! vector anisotropic: a source surrounded by gas on only one side of an
//! axis keeps the full imbalance instead of averaging it away.

use std::fmt;

/// Per-source directional weight accumulator.
///
/// # Write discipline
///
/// The accumulator must be fully zeroed before the first weighting pass.
/// Slots 0–6 (scalar + axis pairs) are written only during weight
/// collection; slots 7–10 (auxiliary terms) only during weight
/// finalization, because they are derived from the already-complete
/// collected terms. During injection the accumulator is read-only.
/// Violating this ordering produces silently wrong physics, not a crash,
/// so the pass driver owns the zeroing and the evaluator routes every
/// write through [`merge_directional`](Self::merge_directional) or
/// [`merge_auxiliary`](Self::merge_auxiliary).
///
/// Merging is element-wise addition: commutative and associative, so the
/// order in which partitions report their contributions cannot affect
/// which totals are reachable.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KernelWeights([f64; KernelWeights::LEN]);

impl KernelWeights {
    /// Number of components.
    pub const LEN: usize = 11;

    const SCALAR: usize = 0;
    const RESIDUAL_KINETIC: usize = 7;
    const MOMENTUM_ENERGY_CROSS: usize = 8;
    const COOLING_LIMITED: usize = 9;
    const NORMALIZATION: usize = 10;

    /// Number of slots in the directional (collect-pass) range.
    pub const DIRECTIONAL: usize = 7;

    /// A fully zeroed accumulator.
    pub fn zeroed() -> Self {
        Self([0.0; Self::LEN])
    }

    /// Reset every component to zero.
    pub fn clear(&mut self) {
        self.0 = [0.0; Self::LEN];
    }

    /// Whether every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    fn axis_slots(axis: usize) -> (usize, usize) {
        debug_assert!(axis < 3);
        (1 + 2 * axis, 2 + 2 * axis)
    }

    /// The scalar overlap term.
    pub fn scalar(&self) -> f64 {
        self.0[Self::SCALAR]
    }

    /// Add to the scalar overlap term.
    pub fn add_scalar(&mut self, value: f64) {
        self.0[Self::SCALAR] += value;
    }

    /// The positive-side accumulation for one axis.
    pub fn axis_positive(&self, axis: usize) -> f64 {
        self.0[Self::axis_slots(axis).0]
    }

    /// The negative-side accumulation for one axis (stored ≤ 0).
    pub fn axis_negative(&self, axis: usize) -> f64 {
        self.0[Self::axis_slots(axis).1]
    }

    /// Route a signed per-neighbor axis contribution to the matching
    /// sign slot: positive values accumulate on the positive side,
    /// everything else on the negative side.
    pub fn add_axis_split(&mut self, axis: usize, value: f64) {
        let (pos, neg) = Self::axis_slots(axis);
        if value > 0.0 {
            self.0[pos] += value;
        } else {
            self.0[neg] += value;
        }
    }

    /// Residual kinetic-energy term (mass-coupling second-order energy
    /// correction).
    pub fn residual_kinetic(&self) -> f64 {
        self.0[Self::RESIDUAL_KINETIC]
    }

    /// Add to the residual kinetic-energy term.
    pub fn add_residual_kinetic(&mut self, value: f64) {
        self.0[Self::RESIDUAL_KINETIC] += value;
    }

    /// Momentum/energy cross term.
    pub fn momentum_energy_cross(&self) -> f64 {
        self.0[Self::MOMENTUM_ENERGY_CROSS]
    }

    /// Add to the momentum/energy cross term.
    pub fn add_momentum_energy_cross(&mut self, value: f64) {
        self.0[Self::MOMENTUM_ENERGY_CROSS] += value;
    }

    /// Cooling-limited term (as if every neighbor sat at the terminal
    /// momentum limit).
    pub fn cooling_limited(&self) -> f64 {
        self.0[Self::COOLING_LIMITED]
    }

    /// Add to the cooling-limited term.
    pub fn add_cooling_limited(&mut self, value: f64) {
        self.0[Self::COOLING_LIMITED] += value;
    }

    /// Normalization term (sum of corrected direction norms).
    pub fn normalization(&self) -> f64 {
        self.0[Self::NORMALIZATION]
    }

    /// Add to the normalization term.
    pub fn add_normalization(&mut self, value: f64) {
        self.0[Self::NORMALIZATION] += value;
    }

    /// Accumulate the directional slots (scalar + axis pairs) of `other`.
    /// Used when merging weight-collection contributions.
    pub fn merge_directional(&mut self, other: &KernelWeights) {
        for k in 0..Self::DIRECTIONAL {
            self.0[k] += other.0[k];
        }
    }

    /// Accumulate the auxiliary slots of `other`. Used when merging
    /// weight-finalization contributions.
    pub fn merge_auxiliary(&mut self, other: &KernelWeights) {
        for k in Self::DIRECTIONAL..Self::LEN {
            self.0[k] += other.0[k];
        }
    }

    /// Accumulate every slot of `other`. Used for cross-partition output
    /// reduction, where a single pass only ever populates one of the two
    /// ranges anyway.
    pub fn merge(&mut self, other: &KernelWeights) {
        for k in 0..Self::LEN {
            self.0[k] += other.0[k];
        }
    }

    /// The raw component array.
    pub fn as_array(&self) -> &[f64; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for KernelWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "w[scalar={:.3e}, norm={:.3e}]",
            self.scalar(),
            self.normalization()
        )
    }
}
