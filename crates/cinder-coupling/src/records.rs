//! Input and output records shipped across the exchange.

use cinder_core::{KernelWeights, Phase, Star, METAL_SPECIES};

/// Ejecta velocity stand-in used during the weighting passes, before a
/// source's real event values exist. The weighting math only needs the
/// ejecta preconditions to hold, not the physical values.
pub const WEIGHT_PASS_VELOCITY: f64 = 1.0e-4;

/// Immutable snapshot of the source state a remote evaluator needs.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInput {
    /// Source position.
    pub position: [f64; 3],
    /// Source velocity.
    pub velocity: [f64; 3],
    /// Source kernel support radius.
    pub smoothing_length: f64,
    /// Effective volume entering the face-area weight.
    pub effective_volume: f64,
    /// Total ejecta mass for the pass (the source mass during the
    /// weighting passes, where it only gates preconditions).
    pub ejecta_mass: f64,
    /// Ejecta launch velocity.
    pub ejecta_velocity: f64,
    /// Mass fractions of each species in the ejecta.
    pub yields: [f64; METAL_SPECIES],
    /// The source's weight accumulator as of pass entry.
    pub weights: KernelWeights,
}

impl SourceInput {
    /// Snapshot a star for the given phase.
    ///
    /// A source with no surrounding gas density or zero mass cannot
    /// host events; its snapshot carries zero ejecta and the evaluator
    /// no-ops on it. During injection, a source with no budget for the
    /// pass's event kind likewise snapshots to zero ejecta.
    pub fn from_star(star: &Star, phase: Phase) -> Self {
        let mut input = Self {
            position: star.position,
            velocity: star.velocity,
            smoothing_length: star.smoothing_length,
            effective_volume: star.effective_volume(),
            ejecta_mass: 0.0,
            ejecta_velocity: 0.0,
            yields: [0.0; METAL_SPECIES],
            weights: star.weights,
        };
        if star.local_gas_density <= 0.0 || star.mass == 0.0 {
            return input;
        }
        match phase {
            Phase::WeightCollect | Phase::WeightFinalize => {
                input.ejecta_mass = star.mass;
                input.ejecta_velocity = WEIGHT_PASS_VELOCITY;
            }
            Phase::Inject(kind) => {
                if let Some(ejecta) = star.ejecta.get(kind) {
                    input.ejecta_mass = ejecta.mass;
                    input.ejecta_velocity = ejecta.velocity;
                    input.yields = ejecta.yields;
                }
            }
        }
        input
    }
}

/// Deltas merged back into the owning source after a pass.
///
/// Merging is element-wise addition — commutative and associative —
/// because the order in which partitions evaluate a source's neighbors
/// is unspecified.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoupleOutput {
    /// Total ejecta mass actually deposited into neighbors.
    pub coupled_mass: f64,
    /// Weight contributions from this partition's neighbors.
    pub weights: KernelWeights,
    /// Summed magnitude of each neighbor's momentum change.
    pub injected_radial_momentum: f64,
}

impl CoupleOutput {
    /// An all-zero output.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Merge another partition's output into this one.
    pub fn merge(&mut self, other: &CoupleOutput) {
        self.coupled_mass += other.coupled_mass;
        self.weights.merge(&other.weights);
        self.injected_radial_momentum += other.injected_radial_momentum;
    }
}
