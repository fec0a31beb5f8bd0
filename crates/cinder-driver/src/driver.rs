//! The feedback step state machine.

use std::sync::Mutex;
use std::time::Instant;

use cinder_arena::Partition;
use cinder_core::{FeedbackError, PartitionId, Phase, SearchError, Star, StepClock};
use cinder_coupling::{CoupleOutput, CouplingEngine, SourceInput};
use cinder_events::{EventDeterminer, EventLogRecord, EventTally};
use cinder_exchange::{run_sequential, run_threaded, PairwiseOp};
use cinder_search::CellGrid;
use indexmap::IndexMap;

use crate::config::{DriverConfig, DriverConfigError};
use crate::metrics::StepMetrics;
use crate::sink::DiagnosticsSink;

/// Result of one completed feedback step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepSummary {
    /// Sources active in the weighting passes.
    pub active_sources: usize,
    /// Discrete events produced this step.
    pub events: f64,
    /// Total ejecta mass deposited into gas.
    pub coupled_mass: f64,
    /// Summed magnitude of neighbor momentum changes.
    pub injected_radial_momentum: f64,
    /// Sources whose mass was zeroed by a numeric degeneracy.
    pub degenerate_sources: u64,
}

/// Totals accumulated while applying injection outputs.
#[derive(Debug, Default)]
struct InjectTotals {
    coupled_mass: f64,
    injected_radial_momentum: f64,
    degenerate: u64,
}

/// Orchestrates one feedback step:
/// `determine → WeightCollect → WeightFinalize → Inject(kind)…`
///
/// Owns the event determiner (and through it the optional synthesis
/// engine) and the diagnostics sink. Partitions are borrowed per step;
/// the driver holds no particle state of its own.
pub struct FeedbackDriver {
    config: DriverConfig,
    engine: CouplingEngine,
    determiner: EventDeterminer,
    sink: Box<dyn DiagnosticsSink>,
    pending_records: Vec<EventLogRecord>,
    last_metrics: StepMetrics,
}

impl FeedbackDriver {
    /// Build a driver, validating the configuration.
    pub fn new(
        config: DriverConfig,
        determiner: EventDeterminer,
        sink: Box<dyn DiagnosticsSink>,
    ) -> Result<Self, DriverConfigError> {
        config.validate()?;
        let engine = CouplingEngine::new(config.coupling, config.units);
        Ok(Self {
            config,
            engine,
            determiner,
            sink,
            pending_records: Vec::new(),
            last_metrics: StepMetrics::default(),
        })
    }

    /// Metrics of the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The diagnostics sink, for embedders that poll it.
    pub fn sink(&self) -> &dyn DiagnosticsSink {
        self.sink.as_ref()
    }

    /// Run one feedback step over the given partitions.
    ///
    /// Each phase fully completes — including the cross-partition
    /// exchange — before the next begins, since every phase reads
    /// weight state written by its predecessor. On a search failure
    /// the step is abandoned: no retry, and the failing phase's
    /// outputs are never merged.
    pub fn run_step(
        &mut self,
        partitions: &mut [Partition],
        clock: &StepClock,
    ) -> Result<StepSummary, FeedbackError> {
        let step_start = Instant::now();
        let mut metrics = StepMetrics::default();
        let mut summary = StepSummary::default();

        if clock.time <= 0.0 {
            self.last_metrics = metrics;
            return Ok(summary);
        }

        // 1. Event determination, partition by partition.
        let determine_start = Instant::now();
        let mut tally = EventTally::default();
        for partition in partitions.iter_mut() {
            let partial = self
                .determiner
                .determine(partition, clock, &self.config.units);
            tally.merge(&partial);
        }
        metrics.determine_us = elapsed_us(determine_start);
        metrics.candidates = tally.candidates;
        metrics.events = tally.events;
        metrics.skipped = tally.skipped;
        summary.events = tally.events;

        // 2. Buffer the step's record; hand everything to the sink once
        // the timestep bins are synchronized.
        if let Some(record) = tally.record(clock.time) {
            self.pending_records.push(record);
        }
        if clock.bins_synchronized() {
            for record in self.pending_records.drain(..) {
                self.sink.append(record);
            }
            self.sink.flush();
        }

        // 3. Weight accumulators must be fully zeroed before the first
        // weighting pass; stale values would silently corrupt the
        // physics rather than crash.
        for partition in partitions.iter_mut() {
            for (_, star) in partition.stars_mut().iter_mut() {
                star.weights.clear();
            }
        }

        // 4. One neighbor grid per partition, reused by every phase —
        // positions do not change within the step.
        let grids: IndexMap<PartitionId, CellGrid> = partitions
            .iter()
            .map(|p| (p.id(), CellGrid::build(p)))
            .collect();

        // 5. The ordered phases, with an implicit barrier after each
        // exchange.
        let totals = Mutex::new(InjectTotals::default());
        for phase in Phase::sequence(&self.config.inject_kinds) {
            let phase_start = Instant::now();
            let pass = CouplingPass {
                engine: &self.engine,
                phase,
                grids: &grids,
                totals: &totals,
            };
            let active = if self.config.threaded {
                run_threaded(&pass, partitions)
            } else {
                run_sequential(&pass, partitions)
            }
            .map_err(FeedbackError::Exchange)?;
            metrics
                .phase_us
                .push((phase.to_string(), elapsed_us(phase_start)));
            if phase == Phase::WeightCollect {
                metrics.active_sources = active;
                summary.active_sources = active;
            }
        }

        let totals = totals.into_inner().expect("inject totals lock poisoned");
        metrics.coupled_mass = totals.coupled_mass;
        metrics.injected_radial_momentum = totals.injected_radial_momentum;
        metrics.degenerate_sources = totals.degenerate;
        summary.coupled_mass = totals.coupled_mass;
        summary.injected_radial_momentum = totals.injected_radial_momentum;
        summary.degenerate_sources = totals.degenerate;

        metrics.total_us = elapsed_us(step_start);
        self.last_metrics = metrics;
        Ok(summary)
    }
}

fn elapsed_us(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// One phase of the coupling loop as an exchange operation.
struct CouplingPass<'a> {
    engine: &'a CouplingEngine,
    phase: Phase,
    grids: &'a IndexMap<PartitionId, CellGrid>,
    totals: &'a Mutex<InjectTotals>,
}

impl PairwiseOp for CouplingPass<'_> {
    type Input = SourceInput;
    type Output = CoupleOutput;

    fn is_active(&self, star: &Star) -> bool {
        if star.mass <= 0.0 || star.smoothing_length <= 0.0 || star.neighbor_count <= 0.0 {
            return false;
        }
        match self.phase {
            Phase::WeightCollect | Phase::WeightFinalize => star.has_ejecta(),
            Phase::Inject(kind) => star
                .ejecta
                .get(kind)
                .map(|e| e.mass > 0.0)
                .unwrap_or(false),
        }
    }

    fn load(&self, star: &Star) -> SourceInput {
        SourceInput::from_star(star, self.phase)
    }

    fn evaluate(
        &self,
        input: &SourceInput,
        partition: &mut Partition,
    ) -> Result<CoupleOutput, SearchError> {
        let Some(grid) = self.grids.get(&partition.id()) else {
            return Err(SearchError::Backend {
                reason: format!("no neighbor grid for partition {}", partition.id()),
            });
        };
        let mut scratch = Vec::with_capacity(64);
        self.engine
            .evaluate(input, self.phase, partition, grid, &mut scratch)
    }

    fn merge(acc: &mut CoupleOutput, other: CoupleOutput) {
        acc.merge(&other);
    }

    fn apply(&self, star: &mut Star, output: CoupleOutput) {
        let degenerate = self.engine.apply(star, &output, self.phase);
        if matches!(self.phase, Phase::Inject(_)) {
            let mut totals = self.totals.lock().expect("inject totals lock poisoned");
            totals.coupled_mass += output.coupled_mass;
            totals.injected_radial_momentum += output.injected_radial_momentum;
            if degenerate {
                totals.degenerate += 1;
            }
        }
    }
}
