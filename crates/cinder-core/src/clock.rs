//! Per-step timing context handed down by the outer integrator.

use crate::id::{StepId, TimeBin};

/// Snapshot of the outer loop's clock for one feedback step.
///
/// The feedback engine never advances time itself; the integrator owns
/// the clock and passes this read-only view in. The two bin fields
/// drive the diagnostics flush cadence: records buffer until the
/// highest active and highest occupied bins coincide, which is when
/// every particle in the simulation has been synchronized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepClock {
    /// Current simulation time (internal units).
    pub time: f64,
    /// Current step number.
    pub step: StepId,
    /// Highest timestep bin with active particles this step.
    pub highest_active_bin: TimeBin,
    /// Highest timestep bin with any particles at all.
    pub highest_occupied_bin: TimeBin,
}

impl StepClock {
    /// Whether every occupied timestep bin is active this step.
    pub fn bins_synchronized(&self) -> bool {
        self.highest_active_bin == self.highest_occupied_bin
    }
}
