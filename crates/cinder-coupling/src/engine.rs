//! The shared per-(source, phase) pairwise evaluator.

use cinder_arena::Partition;
use cinder_core::units::UnitSystem;
use cinder_core::{vec3, EventKind, KernelWeights, Phase, SearchError, Star, METAL_SPECIES};
use cinder_kernel::{evaluate, face_area, solid_angle_weight, zero_point, KernelScale, KernelValue};
use cinder_search::NeighborSearch;

use crate::boost::{BoostInputs, BoostModel, SourceCorrection};
use crate::cooling::annulus_scales;
use crate::density::constant_volume_rescale;
use crate::direction::corrected_direction;
use crate::records::{CoupleOutput, SourceInput};
use crate::MIN_WEIGHT;

/// Maximum ejecta velocity, km/s. No unphysical ejecta.
pub const EJECTA_VELOCITY_MAX_KMS: f64 = 1.0e4;

/// Absolute locality cutoff on couplings, kiloparsecs. A performance
/// and locality bound, not physics.
pub const COUPLING_RANGE_KPC: f64 = 2.0;

/// Tunable knobs of the coupling engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CouplingParams {
    /// Momentum boost strategy.
    pub boost_model: BoostModel,
    /// When set, residual ejecta energy is discarded instead of being
    /// added as internal energy.
    pub momentum_only: bool,
    /// Reference metallicity for the cooling scales.
    pub solar_metallicity: f64,
    /// Locality cutoff in kiloparsecs.
    pub coupling_range_kpc: f64,
    /// Ejecta velocity clamp in km/s.
    pub max_ejecta_velocity_kms: f64,
}

impl Default for CouplingParams {
    fn default() -> Self {
        Self {
            boost_model: BoostModel::Strict,
            momentum_only: false,
            solar_metallicity: cinder_core::units::SOLAR_METALLICITY,
            coupling_range_kpc: COUPLING_RANGE_KPC,
            max_ejecta_velocity_kms: EJECTA_VELOCITY_MAX_KMS,
        }
    }
}

/// The shared pairwise evaluator for weight and injection passes.
///
/// Stateless across calls: all per-source state travels in
/// [`SourceInput`] and [`CoupleOutput`], so the same engine value can be
/// shared by every partition worker.
#[derive(Clone, Copy, Debug)]
pub struct CouplingEngine {
    params: CouplingParams,
    units: UnitSystem,
}

impl CouplingEngine {
    /// An engine with the given knobs and unit system.
    pub fn new(params: CouplingParams, units: UnitSystem) -> Self {
        Self { params, units }
    }

    /// The engine's knobs.
    pub fn params(&self) -> &CouplingParams {
        &self.params
    }

    /// The engine's unit system.
    pub fn units(&self) -> &UnitSystem {
        &self.units
    }

    /// Evaluate one source against one partition's gas for one phase.
    ///
    /// Weighting phases leave the gas untouched and return weight
    /// contributions; injection phases mutate the partition's gas and
    /// return the coupled-mass and momentum totals. A source with no
    /// ejecta budget or no kernel extent is a no-op.
    pub fn evaluate(
        &self,
        input: &SourceInput,
        phase: Phase,
        partition: &mut Partition,
        search: &dyn NeighborSearch,
        scratch: &mut Vec<cinder_core::GasId>,
    ) -> Result<CoupleOutput, SearchError> {
        let mut out = CoupleOutput::zeroed();
        if input.ejecta_mass <= 0.0 || input.smoothing_length <= 0.0 {
            return Ok(out);
        }

        let scale = KernelScale::new(input.smoothing_length);
        let h2 = input.smoothing_length * input.smoothing_length;

        let v_max = self.params.max_ejecta_velocity_kms / self.units.kms_per_velocity();
        let v_clamped = input.ejecta_velocity.min(v_max);
        let correction = match phase {
            Phase::WeightCollect | Phase::WeightFinalize => SourceCorrection::identity(v_clamped),
            Phase::Inject(_) => self
                .params
                .boost_model
                .source_correction(input, v_clamped),
        };
        let v_effective = correction.ejecta_velocity;
        let total_energy = 0.5 * input.ejecta_mass * v_effective * v_effective;
        let e51 = total_energy / self.units.supernova_energy();

        let kind = phase.inject_kind();
        let is_supernova = kind.map(EventKind::is_supernova).unwrap_or(false);
        // Effective remnant energy entering the cooling scales: unity
        // during the weighting passes, the supernova branch adds the
        // free-expansion offset.
        let e51_effective = if phase.is_weight() {
            1.0
        } else if is_supernova {
            e51 + 1.0
        } else {
            e51
        };

        let range = self.params.coupling_range_kpc / self.units.kpc_per_length();
        let range2 = range * range;

        let mut effective_volume = input.effective_volume;
        if !(effective_volume >= 0.0) || !effective_volume.is_finite() {
            effective_volume = 0.0;
        }

        scratch.clear();
        search.query_pairs(input.position, input.smoothing_length, scratch)?;

        for i in 0..scratch.len() {
            let gas_id = scratch[i];
            let Some(gas) = partition.gas_mut().get_mut(gas_id) else {
                continue;
            };
            if gas.mass <= 0.0 {
                continue;
            }
            let dp = vec3::sub(input.position, gas.position);
            let r2 = vec3::norm_squared(dp);
            if r2 <= 0.0 {
                continue; // same particle
            }
            let h2j = gas.smoothing_length * gas.smoothing_length;
            if r2 > h2 && r2 > h2j {
                continue; // outside both kernels
            }
            if r2 > range2 {
                continue; // beyond the locality cutoff
            }
            let r = r2.sqrt();

            let u = r * scale.hinv;
            let kernel_i = if u < 1.0 {
                evaluate(u, &scale)
            } else {
                KernelValue::default()
            };
            let (scale_j, kernel_j) = if gas.smoothing_length > 0.0 {
                let sj = KernelScale::new(gas.smoothing_length);
                let uj = r * sj.hinv;
                let kj = if uj < 1.0 {
                    evaluate(uj, &sj)
                } else {
                    KernelValue::default()
                };
                (Some(sj), kj)
            } else {
                (None, KernelValue::default())
            };

            let area = face_area(
                effective_volume,
                kernel_i.dwk,
                gas.volume(),
                kernel_j.dwk,
            );
            let wk = solid_angle_weight(area, r);
            if wk <= 0.0 || wk.is_nan() {
                continue; // no physical weight on this pair
            }

            let mut contribution = KernelWeights::zeroed();
            contribution.add_scalar(wk);
            for axis in 0..3 {
                contribution.add_axis_split(axis, wk * dp[axis] / r);
            }

            let scales = annulus_scales(
                e51_effective,
                gas.density,
                gas.metallicity[0],
                self.params.solar_metallicity,
                &self.units,
            );

            match phase {
                Phase::WeightCollect => {
                    out.weights.merge_directional(&contribution);
                }
                Phase::WeightFinalize => {
                    let (dir, norm) = corrected_direction(&input.weights, &contribution);
                    if norm > MIN_WEIGHT {
                        let mut relative_ke = 0.0;
                        let mut alignment = 0.0;
                        for axis in 0..3 {
                            let v_rel = gas.velocity[axis] - input.velocity[axis];
                            relative_ke += v_rel * v_rel;
                            alignment += v_rel * dir[axis] / norm;
                        }
                        contribution.add_residual_kinetic(wk * relative_ke);
                        contribution
                            .add_momentum_energy_cross((norm * gas.mass).sqrt() * alignment);
                        contribution
                            .add_cooling_limited(norm * alignment / scales.cooling_velocity);
                        contribution.add_normalization(norm);
                        out.weights.merge_auxiliary(&contribution);
                    }
                }
                Phase::Inject(inject_kind) => {
                    let (dir, norm) = corrected_direction(&input.weights, &contribution);
                    if !(norm > MIN_WEIGHT) || !norm.is_finite() {
                        continue;
                    }

                    let coupled_mass = norm * input.ejecta_mass;
                    let mass_preshock = gas.mass;
                    let mass_fraction = coupled_mass / (coupled_mass + gas.mass);

                    // Momentum before the deposit, in the source frame.
                    let momentum_before = vec3::scale(
                        vec3::sub(gas.velocity, input.velocity),
                        gas.mass,
                    );

                    // Seed the density with the arriving mass, then apply
                    // the constant-volume rescale.
                    match &scale_j {
                        None => {
                            if gas.density > 0.0 {
                                gas.density *= 1.0 + coupled_mass / gas.mass;
                            } else {
                                gas.density = coupled_mass * scale.hinv3;
                            }
                        }
                        Some(sj) => {
                            gas.density += zero_point() * coupled_mass * sj.hinv3;
                        }
                    }
                    gas.density =
                        constant_volume_rescale(gas.density, gas.mass, coupled_mass);

                    gas.mass += coupled_mass;
                    out.coupled_mass += coupled_mass;

                    // Rescale velocity so the deposit alone conserves
                    // momentum.
                    let rescale = mass_preshock / gas.mass;
                    for axis in 0..3 {
                        gas.velocity[axis] *= rescale;
                        gas.velocity_predicted[axis] *= rescale;
                    }

                    // Mass-weighted species mixing with the ejecta yields.
                    for species in 0..METAL_SPECIES {
                        gas.metallicity[species] = (1.0 - mass_fraction)
                            * gas.metallicity[species]
                            + mass_fraction * input.yields[species];
                    }

                    let mut recession = 0.0;
                    for axis in 0..3 {
                        recession += (1.0 - mass_fraction) * (dp[axis] / r)
                            * (input.velocity[axis] - gas.velocity[axis]);
                    }

                    let boost = self.params.boost_model.factor(
                        &correction,
                        &BoostInputs {
                            ejecta_mass: input.ejecta_mass,
                            coupled_mass,
                            neighbor_mass_preshock: mass_preshock,
                            direction_norm: norm,
                            cooling_mass: scales.cooling_mass,
                            cooling_velocity: scales.cooling_velocity,
                            recession_velocity: recession,
                            mass_fraction,
                            is_supernova,
                        },
                    );

                    let delta_v = boost * mass_fraction * v_effective;
                    for axis in 0..3 {
                        let kick = delta_v * dir[axis] / norm;
                        gas.velocity[axis] += kick;
                        gas.velocity_predicted[axis] += kick;
                    }

                    let momentum_after = vec3::scale(
                        vec3::sub(gas.velocity, input.velocity),
                        gas.mass,
                    );
                    out.injected_radial_momentum +=
                        vec3::norm(vec3::sub(momentum_after, momentum_before));

                    // Residual internal energy: the neighbor's share of
                    // the budget minus the kinetic energy of the kick.
                    let share = norm * total_energy;
                    let kick_ke = 0.5 * gas.mass * delta_v * delta_v;
                    let residual = share - kick_ke;
                    if residual > 0.0 && !self.params.momentum_only {
                        let specific = residual / gas.mass;
                        gas.internal_energy += specific;
                        gas.internal_energy_predicted += specific;
                    }

                    if inject_kind == EventKind::Wind {
                        gas.wake = true;
                    }
                }
            }
        }

        Ok(out)
    }

    /// Merge a fully reduced output back into the owning source.
    ///
    /// Weighting phases accumulate their weight ranges; injection
    /// deducts the coupled mass and rescales the source velocity so the
    /// removal conserves the source's momentum. Returns `true` when a
    /// numeric degeneracy (NaN or negative derived mass) forced the
    /// source's mass to zero, permanently disabling its feedback.
    pub fn apply(&self, star: &mut Star, output: &CoupleOutput, phase: Phase) -> bool {
        match phase {
            Phase::WeightCollect => {
                star.weights.merge_directional(&output.weights);
                false
            }
            Phase::WeightFinalize => {
                star.weights.merge_auxiliary(&output.weights);
                false
            }
            Phase::Inject(_) => {
                let mass_initial = star.mass;
                star.mass -= output.coupled_mass;
                if star.mass < 0.0 || star.mass.is_nan() {
                    star.mass = 0.0;
                    return true;
                }
                if star.mass > 0.0 {
                    let rescale = mass_initial / star.mass;
                    for axis in 0..3 {
                        star.velocity[axis] *= rescale;
                    }
                }
                false
            }
        }
    }
}
