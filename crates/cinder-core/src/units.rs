//! The fixed internal unit system and its conversion constants.
//!
//! All physical quantities cross module boundaries in one internal unit
//! system; the constants here are the only sanctioned bridge to CGS and
//! astronomical units. The engine performs no unit conversion beyond
//! applying them.

/// Grams per solar mass.
pub const SOLAR_MASS_CGS: f64 = 1.989e33;

/// Grams per proton (hydrogen number-density conversions).
pub const PROTON_MASS_CGS: f64 = 1.6726e-24;

/// Centimeters per kiloparsec.
pub const KPC_CGS: f64 = 3.085678e21;

/// Centimeters per second per km/s.
pub const KMS_CGS: f64 = 1.0e5;

/// Seconds per year.
pub const YEAR_CGS: f64 = 3.15576e7;

/// Canonical supernova energy in erg.
pub const ERG_PER_SUPERNOVA: f64 = 1.0e51;

/// Reference total-metal mass fraction of the Sun.
pub const SOLAR_METALLICITY: f64 = 0.02;

/// The internal unit system: three base conversions to CGS, with every
/// derived conversion computed from them.
///
/// The time unit is derived as `length / velocity`, the energy unit as
/// `mass · velocity²`, and the density unit as `mass / length³`, so the
/// system stays internally consistent by construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSystem {
    /// Grams per internal mass unit.
    pub mass_cgs: f64,
    /// Centimeters per internal length unit.
    pub length_cgs: f64,
    /// cm/s per internal velocity unit.
    pub velocity_cgs: f64,
}

impl UnitSystem {
    /// The galactic convention: 10¹⁰ solar masses, kiloparsecs, km/s.
    ///
    /// The derived time unit is ≈0.978 Gyr.
    pub fn galactic() -> Self {
        Self {
            mass_cgs: 1.0e10 * SOLAR_MASS_CGS,
            length_cgs: KPC_CGS,
            velocity_cgs: KMS_CGS,
        }
    }

    /// Seconds per internal time unit (`length / velocity`).
    pub fn time_cgs(&self) -> f64 {
        self.length_cgs / self.velocity_cgs
    }

    /// Erg per internal energy unit (`mass · velocity²`).
    pub fn energy_cgs(&self) -> f64 {
        self.mass_cgs * self.velocity_cgs * self.velocity_cgs
    }

    /// g/cm³ per internal density unit (`mass / length³`).
    pub fn density_cgs(&self) -> f64 {
        self.mass_cgs / (self.length_cgs * self.length_cgs * self.length_cgs)
    }

    /// Solar masses per internal mass unit.
    pub fn solar_per_mass(&self) -> f64 {
        self.mass_cgs / SOLAR_MASS_CGS
    }

    /// Kiloparsecs per internal length unit.
    pub fn kpc_per_length(&self) -> f64 {
        self.length_cgs / KPC_CGS
    }

    /// km/s per internal velocity unit.
    pub fn kms_per_velocity(&self) -> f64 {
        self.velocity_cgs / KMS_CGS
    }

    /// Years per internal time unit.
    pub fn years_per_time(&self) -> f64 {
        self.time_cgs() / YEAR_CGS
    }

    /// Megayears per internal time unit.
    pub fn myr_per_time(&self) -> f64 {
        self.years_per_time() / 1.0e6
    }

    /// Gigayears per internal time unit.
    pub fn gyr_per_time(&self) -> f64 {
        self.years_per_time() / 1.0e9
    }

    /// Hydrogen atoms per cm³, per internal density unit.
    pub fn hydrogen_per_density(&self) -> f64 {
        self.density_cgs() / PROTON_MASS_CGS
    }

    /// One canonical supernova energy (10⁵¹ erg) in internal energy units.
    pub fn supernova_energy(&self) -> f64 {
        ERG_PER_SUPERNOVA / self.energy_cgs()
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::galactic()
    }
}
