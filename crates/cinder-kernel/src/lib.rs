//! Smoothing-kernel math for the Cinder feedback engine.
//!
//! The cubic-spline kernel with compact support `r < h`, in the
//! convention where `u = r/h` and the 3D normalization is `8/π`.
//! On top of it, the symmetrized effective face area between two
//! particles and the anisotropic solid-angle weight derived from it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::f64::consts::PI;

/// 3D normalization of the cubic spline.
const CUBIC_NORM: f64 = 8.0 / PI;

/// Precomputed inverse powers of a smoothing length.
///
/// `hinv3` scales the kernel value, `hinv4` its radial derivative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelScale {
    /// `1 / h`.
    pub hinv: f64,
    /// `1 / h³`.
    pub hinv3: f64,
    /// `1 / h⁴`.
    pub hinv4: f64,
}

impl KernelScale {
    /// Scales for smoothing length `h`.
    ///
    /// `h` must be positive; callers gate on that before constructing.
    pub fn new(h: f64) -> Self {
        debug_assert!(h > 0.0);
        let hinv = 1.0 / h;
        let hinv3 = hinv * hinv * hinv;
        Self {
            hinv,
            hinv3,
            hinv4: hinv3 * hinv,
        }
    }
}

/// Kernel value and radial derivative at one separation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KernelValue {
    /// `W(r, h)`.
    pub wk: f64,
    /// `dW/dr (r, h)` — non-positive inside the support.
    pub dwk: f64,
}

/// Evaluate the cubic spline at `u = r/h` with the given scales.
///
/// Outside the support (`u >= 1`) both value and derivative are zero.
pub fn evaluate(u: f64, scale: &KernelScale) -> KernelValue {
    if u >= 1.0 {
        return KernelValue::default();
    }
    let (w, dw) = if u < 0.5 {
        (
            1.0 - 6.0 * u * u + 6.0 * u * u * u,
            (-12.0 + 18.0 * u) * u,
        )
    } else {
        let t = 1.0 - u;
        (2.0 * t * t * t, -6.0 * t * t)
    };
    KernelValue {
        wk: CUBIC_NORM * scale.hinv3 * w,
        dwk: CUBIC_NORM * scale.hinv4 * dw,
    }
}

/// The kernel's central value with unit smoothing length: `W(0, 1)`.
///
/// Used when seeding density from injected mass at a neighbor's own
/// kernel center.
pub fn zero_point() -> f64 {
    CUBIC_NORM
}

/// Symmetrized effective face area between two particles, from both
/// kernel-derivative volumes: `|V_i²·dW_i + V_j²·dW_j|`.
pub fn face_area(volume_i: f64, dwk_i: f64, volume_j: f64, dwk_j: f64) -> f64 {
    (volume_i * volume_i * dwk_i + volume_j * volume_j * dwk_j).abs()
}

/// Anisotropic solid-angle weight for a face of the given area at
/// separation `r`:
///
/// `wk = ½ (1 − 1/√(1 + A/(π r²)))`
///
/// Unlike a naive `1/N` split, these weights partition the source's full
/// solid angle even for irregular neighbor distributions: a face seen
/// under half the sky approaches ½, a vanishing face approaches 0.
pub fn solid_angle_weight(area: f64, r: f64) -> f64 {
    0.5 * (1.0 - 1.0 / (1.0 + area / (PI * r * r)).sqrt())
}
