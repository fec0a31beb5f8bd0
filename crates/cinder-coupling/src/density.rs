//! The constant-volume density rescale applied on mass injection.

/// Rescale a density for the addition of `added_mass` to a particle of
/// `mass`, holding the particle's effective volume fixed:
///
/// `ρ' = ρ · (1 + Δm/m)`
///
/// The derivation of this rescale is undocumented, but downstream
/// smoothing-length updates are calibrated against it, so it stays a
/// named formula with its own tests rather than being altered.
pub fn constant_volume_rescale(density: f64, mass: f64, added_mass: f64) -> f64 {
    density * (1.0 + added_mass / mass)
}
