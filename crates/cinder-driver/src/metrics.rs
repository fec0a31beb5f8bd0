//! Per-step performance and accounting metrics.

/// Timing and accounting data for a single feedback step.
///
/// All durations are in microseconds. Populated by the driver after
/// each `run_step()`; consumers read them from the most recent step.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Time spent in event determination, in microseconds.
    pub determine_us: u64,
    /// Per-phase execution times: `(phase name, microseconds)`.
    pub phase_us: Vec<(String, u64)>,
    /// Sources active in the weighting passes.
    pub active_sources: usize,
    /// Candidate sources scanned by event determination.
    pub candidates: f64,
    /// Discrete events produced this step.
    pub events: f64,
    /// Sources skipped by a precondition.
    pub skipped: u64,
    /// Sources whose mass was zeroed by a numeric degeneracy.
    pub degenerate_sources: u64,
    /// Total ejecta mass deposited into gas this step.
    pub coupled_mass: f64,
    /// Summed magnitude of neighbor momentum changes this step.
    pub injected_radial_momentum: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.determine_us, 0);
        assert!(m.phase_us.is_empty());
        assert_eq!(m.active_sources, 0);
        assert_eq!(m.candidates, 0.0);
        assert_eq!(m.events, 0.0);
        assert_eq!(m.skipped, 0);
        assert_eq!(m.degenerate_sources, 0);
        assert_eq!(m.coupled_mass, 0.0);
        assert_eq!(m.injected_radial_momentum, 0.0);
    }
}
