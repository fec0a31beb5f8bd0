//! Cooling-mass, terminal-velocity, and cooling-radius scales.
//!
//! A remnant expands conserving energy until radiative losses in the
//! swept-up shell take over, after which it snowplows at its terminal
//! momentum. These scales mark that transition for the gas conditions
//! of one annulus; the boost factor consumes the mass and velocity
//! scales, the radius is the named estimate of where the transition
//! happens.

use cinder_core::units::UnitSystem;

/// Terminal shell velocity at solar metallicity and unit density, km/s.
pub const TERMINAL_VELOCITY_KMS: f64 = 210.0;

/// Floor on the density/metallicity scaling of the terminal velocity.
pub const TERMINAL_SCALING_FLOOR: f64 = 0.5;

/// Cooling-mass normalization in grams, per unit remnant energy.
pub const COOLING_MASS_NORM_CGS: f64 = 4.56e36;

/// Cap on the cooling mass, in solar masses. Equivalent to capping the
/// terminal momentum at 6×10⁵ km/s per solar mass of ejecta.
pub const COOLING_MASS_CAP_SOLAR: f64 = 5382.0;

/// Cooling-radius normalization in kiloparsecs.
pub const COOLING_RADIUS_NORM_KPC: f64 = 0.0284;

/// Energy exponent of the cooling-radius scaling (weak external
/// pressure).
pub const COOLING_RADIUS_EXPONENT: f64 = 0.286;

/// Power of the density×metallicity dependence of the terminal
/// momentum.
pub const TERMINAL_MOMENTUM_EXPONENT: f64 = 1.0 / 7.0;

/// Floor on the hydrogen number density entering the scaling, cm⁻³.
pub const DENSITY_FLOOR_NH: f64 = 0.001;

/// Floor on the metallicity ratio entering the scaling, in solar units.
pub const METALLICITY_FLOOR: f64 = 0.01;

/// `3/(4π)`: converts a mass at a given density into the cube of its
/// equivalent radius.
const SPHERE_VOLUME_FACTOR: f64 = 0.238732;

/// Transition scales for one annulus of gas around a source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoolingScales {
    /// Terminal shell velocity (internal units).
    pub cooling_velocity: f64,
    /// Swept-up mass at which cooling takes over (internal units).
    pub cooling_mass: f64,
    /// Radius enclosing the cooling mass at the annulus density
    /// (internal units).
    pub cooling_radius: f64,
}

/// Base cooling-radius scale from the ejecta energy alone, before any
/// annulus refinement.
///
/// For true supernovae the scale grows as `(1+E₅₁)^0.286`, keeping a
/// finite free-expansion radius at vanishing energy; winds and tracers
/// scale from the bare energy so the radius degrades smoothly to zero
/// as the mass loading vanishes.
pub fn base_cooling_radius(e51: f64, is_supernova: bool, units: &UnitSystem) -> f64 {
    let base = COOLING_RADIUS_NORM_KPC / units.kpc_per_length();
    if is_supernova {
        base * (1.0 + e51).powf(COOLING_RADIUS_EXPONENT)
    } else {
        base * e51.powf(COOLING_RADIUS_EXPONENT)
    }
}

/// Compute the transition scales for an annulus with the given gas
/// density (internal units) and total-metal mass fraction.
///
/// `e51` is the effective remnant energy in units of 10⁵¹ erg — the
/// caller includes the supernova "+1" offset where it applies.
/// `solar_metallicity` is the reference total-metal abundance.
pub fn annulus_scales(
    e51: f64,
    gas_density: f64,
    metallicity: f64,
    solar_metallicity: f64,
    units: &UnitSystem,
) -> CoolingScales {
    let mut n0 = gas_density * units.hydrogen_per_density();
    if n0 < DENSITY_FLOOR_NH {
        n0 = DENSITY_FLOOR_NH;
    }
    let mut z0 = metallicity / solar_metallicity;
    if z0 < METALLICITY_FLOOR {
        z0 = METALLICITY_FLOOR;
    }
    // Sub-solar gas cools less efficiently than the linear scaling
    // suggests; the z^1.5 branch captures that.
    let z_term = if z0 < 1.0 { z0 * z0.sqrt() } else { z0 };
    let nz = (n0 * z_term).powf(TERMINAL_MOMENTUM_EXPONENT);

    let cooling_velocity =
        TERMINAL_VELOCITY_KMS * nz.max(TERMINAL_SCALING_FLOOR) / units.kms_per_velocity();

    let mut cooling_mass = COOLING_MASS_NORM_CGS * e51 / (nz * nz) / units.mass_cgs;
    let cap = COOLING_MASS_CAP_SOLAR / units.solar_per_mass();
    if cooling_mass > cap {
        cooling_mass = cap;
    }

    let cooling_radius = if gas_density > 0.0 {
        (SPHERE_VOLUME_FACTOR * cooling_mass / gas_density).powf(1.0 / 3.0)
    } else {
        0.0
    };

    CoolingScales {
        cooling_velocity,
        cooling_mass,
        cooling_radius,
    }
}
