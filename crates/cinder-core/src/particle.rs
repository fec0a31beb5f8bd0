//! Particle records: star-like feedback sources and gas receivers.
//!
//! Physical fields persist and mutate in place across timesteps; the
//! per-step event state on [`Star`] (event counts, ejecta budgets, the
//! weight accumulator) is recomputed fresh each active step.

use crate::phase::EventKind;
use crate::weights::KernelWeights;
use crate::TimeBin;

/// Number of tracked metal species: total metallicity plus ten
/// individual elements, matching the yield vectors produced by the
/// enrichment tables.
pub const METAL_SPECIES: usize = 11;

/// Opaque serialized state of an external population-synthesis cluster.
///
/// The engine that owns the bytes is the only party that can interpret
/// them; Cinder round-trips them through [`Star::cluster`] untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterState(pub Vec<u8>);

/// Ejecta budget for one event kind on one source, for the current step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ejecta {
    /// Total ejecta mass (internal mass units).
    pub mass: f64,
    /// Ejecta velocity at launch (internal velocity units).
    pub velocity: f64,
    /// Mass fractions of each tracked species in the ejecta.
    pub yields: [f64; METAL_SPECIES],
}

impl Ejecta {
    /// A budget with the given mass and velocity and zero yields.
    pub fn new(mass: f64, velocity: f64) -> Self {
        Self {
            mass,
            velocity,
            yields: [0.0; METAL_SPECIES],
        }
    }
}

/// Small per-[`EventKind`] container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerKind<T>([T; 3]);

impl<T> PerKind<T> {
    /// Shared access for one kind.
    pub fn get(&self, kind: EventKind) -> &T {
        &self.0[kind.index()]
    }

    /// Mutable access for one kind.
    pub fn get_mut(&mut self, kind: EventKind) -> &mut T {
        &mut self.0[kind.index()]
    }

    /// Iterate `(kind, value)` pairs in injection order.
    pub fn iter(&self) -> impl Iterator<Item = (EventKind, &T)> {
        EventKind::ALL.iter().map(move |&k| (k, &self.0[k.index()]))
    }
}

/// A star-like feedback source.
#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    /// Position (internal length units).
    pub position: [f64; 3],
    /// Velocity (internal velocity units).
    pub velocity: [f64; 3],
    /// Mass (internal mass units). Forced to exactly zero on numeric
    /// degeneracy, which permanently disables feedback from this source.
    pub mass: f64,
    /// Simulation time at which the population formed.
    pub birth_time: f64,
    /// Adaptive kernel support radius.
    pub smoothing_length: f64,
    /// Effective neighbor number from the density fit.
    pub neighbor_count: f64,
    /// Gas density in the source's kernel, from the last density pass.
    pub local_gas_density: f64,
    /// Mass fractions of each tracked species at formation.
    pub metallicity: [f64; METAL_SPECIES],
    /// Physical timestep assigned by the outer integrator.
    pub dt: f64,
    /// Timestep bin assigned by the outer integrator.
    pub time_bin: TimeBin,
    /// Discrete events produced this step.
    pub events_this_step: u32,
    /// Lifetime event count.
    pub cumulative_events: f64,
    /// Per-kind ejecta budgets for this step; `None` means no release
    /// of that kind.
    pub ejecta: PerKind<Option<Ejecta>>,
    /// Directional weight accumulator (per-step; zeroed by the driver).
    pub weights: KernelWeights,
    /// Serialized population-synthesis state, when the cluster source is
    /// in use. Cleared once no live stochastic stars remain, which marks
    /// the particle inactive for future event determination.
    pub cluster: Option<ClusterState>,
    /// Remaining massive-star budget, when discrete IMF sampling is in
    /// use; decremented by each event, floored at zero.
    pub massive_stars_remaining: Option<f64>,
}

impl Star {
    /// A source at rest with the given position, mass, and birth time.
    /// Kernel geometry starts unset; the density pass fills it in.
    pub fn new(position: [f64; 3], mass: f64, birth_time: f64) -> Self {
        Self {
            position,
            velocity: [0.0; 3],
            mass,
            birth_time,
            smoothing_length: 0.0,
            neighbor_count: 0.0,
            local_gas_density: 0.0,
            metallicity: [0.0; METAL_SPECIES],
            dt: 0.0,
            time_bin: TimeBin(0),
            events_this_step: 0,
            cumulative_events: 0.0,
            ejecta: PerKind::default(),
            weights: KernelWeights::zeroed(),
            cluster: None,
            massive_stars_remaining: None,
        }
    }

    /// Stellar age at the given simulation time. Non-positive values
    /// mean the particle cannot host events yet.
    pub fn age_at(&self, time: f64) -> f64 {
        time - self.birth_time
    }

    /// Effective volume entering the face-area weight: the cube of the
    /// per-neighbor kernel extent `h / N_ngb`.
    pub fn effective_volume(&self) -> f64 {
        if self.neighbor_count <= 0.0 {
            return 0.0;
        }
        let heff = self.smoothing_length / self.neighbor_count;
        heff * heff * heff
    }

    /// Whether any ejecta budget is present this step.
    pub fn has_ejecta(&self) -> bool {
        self.ejecta.iter().any(|(_, e)| e.is_some())
    }

    /// Reset the per-step event state ahead of event determination.
    pub fn clear_step_state(&mut self) {
        self.events_this_step = 0;
        self.ejecta = PerKind::default();
    }
}

/// A gas particle receiving feedback.
#[derive(Clone, Debug, PartialEq)]
pub struct Gas {
    /// Position (internal length units).
    pub position: [f64; 3],
    /// Velocity (internal velocity units).
    pub velocity: [f64; 3],
    /// Drift-predicted velocity kept consistent with `velocity` by every
    /// feedback mutation.
    pub velocity_predicted: [f64; 3],
    /// Mass (internal mass units).
    pub mass: f64,
    /// Mass density (internal density units).
    pub density: f64,
    /// Specific internal energy.
    pub internal_energy: f64,
    /// Drift-predicted specific internal energy.
    pub internal_energy_predicted: f64,
    /// Mass fractions of each tracked species.
    pub metallicity: [f64; METAL_SPECIES],
    /// Adaptive kernel support radius.
    pub smoothing_length: f64,
    /// Set when a wind injection touches this particle, asking the outer
    /// integrator to shorten its next timestep.
    pub wake: bool,
}

impl Gas {
    /// A gas particle at rest with the given position, mass, density,
    /// and smoothing length.
    pub fn new(position: [f64; 3], mass: f64, density: f64, smoothing_length: f64) -> Self {
        Self {
            position,
            velocity: [0.0; 3],
            velocity_predicted: [0.0; 3],
            mass,
            density,
            internal_energy: 0.0,
            internal_energy_predicted: 0.0,
            metallicity: [0.0; METAL_SPECIES],
            smoothing_length,
            wake: false,
        }
    }

    /// Kernel-volume estimate `mass / density`, used in the symmetrized
    /// face-area weight. Zero when the density is unusable.
    pub fn volume(&self) -> f64 {
        if self.density <= 0.0 || !self.density.is_finite() {
            return 0.0;
        }
        self.mass / self.density
    }
}
