//! The population-synthesis capability interface.

use cinder_core::METAL_SPECIES;

/// What an external synthesis engine reports after advancing one
/// cluster to its new age.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterStep {
    /// Discrete events that occurred since the previous advance.
    pub events: u32,
    /// Ejecta mass released since the previous advance, in solar
    /// masses.
    pub ejecta_mass_solar: f64,
    /// Per-species ejecta mass fractions, if the engine tracks yields.
    pub yields: Option<[f64; METAL_SPECIES]>,
    /// Stochastic stars still alive in the cluster. Zero means the
    /// cluster is spent and its particle goes inactive.
    pub live_stars: u32,
}

/// An external stochastic population-synthesis engine.
///
/// The engine's event accounting is cumulative between advances, so its
/// internal clock must only ever move forward from one call site:
/// [`EventDeterminer::determine`](crate::EventDeterminer::determine).
/// That is enforced structurally — the determiner owns the boxed engine
/// and nothing else can reach it.
///
/// `state` is the particle's opaque serialized cluster; implementations
/// deserialize it, advance to `cluster_age_years` (absolute age, not a
/// delta), and serialize back into the same buffer before returning.
pub trait PopulationSynthesis: Send {
    /// Advance one cluster to the given absolute age in years.
    fn advance_to_time(
        &mut self,
        state: &mut cinder_core::ClusterState,
        cluster_age_years: f64,
    ) -> ClusterStep;
}
