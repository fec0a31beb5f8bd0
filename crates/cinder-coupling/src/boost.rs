//! Momentum boost strategies.
//!
//! As unresolved ejecta sweep up gas inside the cooling radius they do
//! work on it, so the momentum delivered to a resolved neighbor exceeds
//! the launch momentum — up to the point where radiative cooling caps
//! the remnant at its terminal momentum. Two strategies model that
//! transition behind one interface; which one runs is configuration,
//! not a build-time switch.

use cinder_core::KernelWeights;

use crate::records::SourceInput;
use crate::MIN_WEIGHT;

/// Momentum boost strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoostModel {
    /// `min(energy-conserving limit, terminal-momentum limit)` with no
    /// further correction. The terminal limit uses the strict form
    /// `√(m_cooling/M_ejecta)` that excludes the launch momentum.
    #[default]
    Strict,
    /// Energy-aware variant: per-source ψ factors derived from the
    /// auxiliary weight terms renormalize both limits so that bulk
    /// gas motion relative to the source cannot create energy from
    /// nothing, and a recession-velocity limiter caps the boost for
    /// neighbors already outrunning the shell.
    CoolingLimited,
}

/// Per-source correction computed once per injection pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceCorrection {
    /// Renormalization of the energy-conserving limit.
    pub psi_energy: f64,
    /// Renormalization of the terminal-momentum limit.
    pub psi_cooling: f64,
    /// Effective ejecta velocity entering the kick and energy budget.
    pub ejecta_velocity: f64,
}

impl SourceCorrection {
    /// No correction: unit ψ factors around the given velocity.
    pub fn identity(ejecta_velocity: f64) -> Self {
        Self {
            psi_energy: 1.0,
            psi_cooling: 1.0,
            ejecta_velocity,
        }
    }
}

/// Per-neighbor quantities the boost depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostInputs {
    /// Total ejecta mass of the source.
    pub ejecta_mass: f64,
    /// Ejecta mass deposited into this neighbor.
    pub coupled_mass: f64,
    /// Neighbor mass before the deposit.
    pub neighbor_mass_preshock: f64,
    /// The neighbor's corrected direction norm (its share of the
    /// coupling budget).
    pub direction_norm: f64,
    /// Cooling mass of this annulus.
    pub cooling_mass: f64,
    /// Terminal shell velocity of this annulus.
    pub cooling_velocity: f64,
    /// Recession velocity of the neighbor from the source along the
    /// separation, after the mass-loading rescale.
    pub recession_velocity: f64,
    /// `Δm / (Δm + m)` mass-loading fraction for this neighbor.
    pub mass_fraction: f64,
    /// Whether the pass injects true supernova ejecta.
    pub is_supernova: bool,
}

impl BoostModel {
    /// Compute the per-source correction for an injection pass.
    ///
    /// [`BoostModel::Strict`] applies no correction. For
    /// [`BoostModel::CoolingLimited`] the ψ factors solve the constant-ψ
    /// energy equation from the weighted cross terms accumulated during
    /// finalization; series expansions replace the exact solutions where
    /// they would lose precision.
    pub fn source_correction(&self, input: &SourceInput, ejecta_velocity: f64) -> SourceCorrection {
        match self {
            BoostModel::Strict => SourceCorrection::identity(ejecta_velocity),
            BoostModel::CoolingLimited => {
                let weights: &KernelWeights = &input.weights;
                if weights.scalar() <= MIN_WEIGHT {
                    return SourceCorrection::identity(ejecta_velocity);
                }
                let wk_norm = 1.0 / (MIN_WEIGHT + weights.scalar().abs());
                let pnorm_sum = 1.0 / (MIN_WEIGHT + weights.normalization().abs());

                // Residual kinetic energy of the gas relative to the
                // source, folded into the effective launch velocity.
                let vba2 = wk_norm * weights.residual_kinetic();
                let v_eff = (ejecta_velocity * ejecta_velocity + vba2).sqrt();

                let beta_energy = (pnorm_sum / input.ejecta_mass).sqrt() / v_eff
                    * weights.momentum_energy_cross();
                let beta_cooling = pnorm_sum * weights.cooling_limited();

                let psi_energy = if beta_energy > 20.0 {
                    1.0 / (2.0 * beta_energy)
                } else {
                    (1.0 + beta_energy * beta_energy).sqrt() - beta_energy
                };
                let psi_cooling = if beta_cooling > 0.5 {
                    1.0 / (2.0 * beta_cooling)
                } else {
                    1.0
                };

                SourceCorrection {
                    psi_energy,
                    psi_cooling,
                    ejecta_velocity: v_eff,
                }
            }
        }
    }

    /// Compute the momentum boost factor for one neighbor.
    pub fn factor(&self, correction: &SourceCorrection, inputs: &BoostInputs) -> f64 {
        let terminal = (inputs.cooling_mass / inputs.ejecta_mass).sqrt();
        let energy_conserving =
            (1.0 + inputs.neighbor_mass_preshock / inputs.coupled_mass).sqrt();

        match self {
            BoostModel::Strict => terminal.min(energy_conserving),
            BoostModel::CoolingLimited => {
                if !inputs.is_supernova {
                    // Nothing fancy for winds and tracers.
                    return terminal.min(energy_conserving);
                }
                let boost_terminal = terminal * correction.psi_cooling;
                let boost_energy = energy_conserving * correction.psi_energy;

                // Cooling mass apportioned to this neighbor's cone.
                let cone_cooling_mass = inputs.direction_norm * inputs.cooling_mass;
                let (mut factor, psi0) = if cone_cooling_mass < inputs.neighbor_mass_preshock
                    || boost_terminal < boost_energy
                {
                    (boost_terminal, correction.psi_cooling.max(1.0))
                } else {
                    (boost_energy, correction.psi_energy.max(1.0))
                };
                if factor < 1.0 {
                    factor = 1.0;
                }

                // A neighbor already receding faster than the shell's
                // stall velocity can never be accelerated to more than
                // the launch velocity over its own recession.
                let v_stall = (inputs.cooling_velocity / psi0)
                    .min(correction.ejecta_velocity / factor);
                let v_limit = v_stall.max(inputs.recession_velocity);
                let cap = 1000.0_f64.min(correction.ejecta_velocity / v_limit);
                factor.min(cap)
            }
        }
    }
}
