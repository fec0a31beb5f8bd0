//! End-to-end feedback step tests: cross-partition coupling through
//! the full phase sequence, runner equivalence, fatal aborts, and the
//! diagnostics cadence.

use std::sync::{Arc, Mutex};

use cinder_arena::Partition;
use cinder_core::{
    ClusterState, FeedbackError, Gas, PartitionId, Star, StepClock, StepId, TimeBin,
};
use cinder_driver::{DiagnosticsSink, DriverConfig, FeedbackDriver, MemorySink};
use cinder_events::{ClusterStep, EventDeterminer, EventLogRecord, EventSource, PopulationSynthesis};
use cinder_test_utils::{fibonacci_sphere, total_mass};

/// Deterministic synthesis engine: the same report every advance.
struct FixedSynthesis {
    report: ClusterStep,
}

impl PopulationSynthesis for FixedSynthesis {
    fn advance_to_time(&mut self, _state: &mut ClusterState, _age_years: f64) -> ClusterStep {
        self.report
    }
}

fn fixed_source(ejecta_mass_solar: f64) -> EventSource {
    EventSource::Cluster(Box::new(FixedSynthesis {
        report: ClusterStep {
            events: 2,
            ejecta_mass_solar,
            yields: None,
            live_stars: 3,
        },
    }))
}

fn clock(time: f64) -> StepClock {
    StepClock {
        time,
        step: StepId(1),
        highest_active_bin: TimeBin(0),
        highest_occupied_bin: TimeBin(0),
    }
}

/// Two partitions: the source lives in partition 0, but half the gas
/// within its kernel is owned by partition 1, so couplings must cross
/// the exchange to be complete.
fn split_scene() -> Vec<Partition> {
    let mut near = Partition::new(PartitionId(0));
    let mut far = Partition::new(PartitionId(1));

    let mut star = Star::new([0.0; 3], 1.0e-4, 0.0);
    star.smoothing_length = 0.1;
    star.neighbor_count = 32.0;
    star.local_gas_density = 1.0;
    star.dt = 1.0e-4;
    star.cluster = Some(ClusterState(vec![0]));
    near.insert_star(star);

    for (i, dir) in fibonacci_sphere(32).into_iter().enumerate() {
        let pos = [dir[0] * 0.05, dir[1] * 0.05, dir[2] * 0.05];
        let gas = Gas::new(pos, 1.0e-8, 1.0, 0.06);
        if i % 2 == 0 {
            near.insert_gas(gas);
        } else {
            far.insert_gas(gas);
        }
    }
    vec![near, far]
}

fn driver_with(config: DriverConfig, ejecta_mass_solar: f64) -> FeedbackDriver {
    FeedbackDriver::new(
        config,
        EventDeterminer::new(fixed_source(ejecta_mass_solar), 11),
        Box::new(MemorySink::new()),
    )
    .expect("default-shaped config validates")
}

#[test]
fn step_couples_across_partitions() {
    let mut partitions = split_scene();
    let mut driver = driver_with(DriverConfig::default(), 50.0);
    let summary = driver.run_step(&mut partitions, &clock(1.0e-3)).unwrap();

    assert_eq!(summary.active_sources, 1);
    assert_eq!(summary.events, 2.0);
    assert!(summary.coupled_mass > 0.0);
    assert!(summary.injected_radial_momentum > 0.0);

    // Gas on BOTH partitions was kicked: remote deposits really merge.
    for partition in &partitions {
        let kicked = partition
            .gas()
            .iter()
            .filter(|(_, g)| g.velocity.iter().any(|&v| v != 0.0))
            .count();
        assert!(kicked > 0, "partition {} untouched", partition.id());
    }

    let metrics = driver.last_metrics();
    assert_eq!(metrics.phase_us.len(), 3); // collect, finalize, inject
    assert_eq!(metrics.events, 2.0);
    assert!(metrics.coupled_mass > 0.0);
}

#[test]
fn step_conserves_total_mass() {
    let mut partitions = split_scene();
    let before = total_mass(&partitions);
    let mut driver = driver_with(DriverConfig::default(), 50.0);
    let summary = driver.run_step(&mut partitions, &clock(1.0e-3)).unwrap();
    let after = total_mass(&partitions);

    assert!(summary.coupled_mass > 0.0);
    assert!(
        (before - after).abs() < 1e-12 * before,
        "mass drifted from {before} to {after}"
    );
}

#[test]
fn threaded_runner_matches_sequential() {
    let mut sequential = split_scene();
    let mut threaded = split_scene();

    driver_with(DriverConfig::default(), 50.0)
        .run_step(&mut sequential, &clock(1.0e-3))
        .unwrap();
    driver_with(
        DriverConfig {
            threaded: true,
            ..Default::default()
        },
        50.0,
    )
    .run_step(&mut threaded, &clock(1.0e-3))
    .unwrap();

    for (a, b) in sequential.iter().zip(&threaded) {
        let gas_a: Vec<_> = a.gas().iter().map(|(_, g)| g.clone()).collect();
        let gas_b: Vec<_> = b.gas().iter().map(|(_, g)| g.clone()).collect();
        assert_eq!(gas_a, gas_b);
        let stars_a: Vec<_> = a.stars().iter().map(|(_, s)| s.clone()).collect();
        let stars_b: Vec<_> = b.stars().iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(stars_a, stars_b);
    }
}

#[test]
fn stale_weights_cannot_leak_into_a_step() {
    let mut clean = split_scene();
    let mut dirty = split_scene();
    // Poison the accumulator before the step; the driver must zero it.
    for partition in dirty.iter_mut() {
        for (_, star) in partition.stars_mut().iter_mut() {
            star.weights.add_scalar(123.0);
            star.weights.add_normalization(-7.0);
        }
    }

    driver_with(DriverConfig::default(), 50.0)
        .run_step(&mut clean, &clock(1.0e-3))
        .unwrap();
    driver_with(DriverConfig::default(), 50.0)
        .run_step(&mut dirty, &clock(1.0e-3))
        .unwrap();

    let weights_of = |partitions: &[Partition]| {
        partitions[0]
            .stars()
            .iter()
            .next()
            .map(|(_, s)| s.weights)
            .unwrap()
    };
    assert_eq!(weights_of(&clean), weights_of(&dirty));
}

#[test]
fn search_failure_aborts_the_step() {
    let mut partitions = split_scene();
    // A second armed source with a non-finite position: its neighbor
    // query is a backend failure, which is fatal for the whole step.
    let mut broken = Star::new([f64::NAN, 0.0, 0.0], 1.0e-4, 0.0);
    broken.smoothing_length = 0.1;
    broken.neighbor_count = 32.0;
    broken.local_gas_density = 1.0;
    broken.dt = 1.0e-4;
    broken.cluster = Some(ClusterState(vec![0]));
    partitions[0].insert_star(broken);

    let mut driver = driver_with(DriverConfig::default(), 50.0);
    let err = driver
        .run_step(&mut partitions, &clock(1.0e-3))
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Exchange(_)));
}

/// Sink sharing its state with the test through an `Arc`.
struct SharedSink {
    state: Arc<Mutex<(Vec<EventLogRecord>, u32)>>,
}

impl DiagnosticsSink for SharedSink {
    fn append(&mut self, record: EventLogRecord) {
        self.state.lock().unwrap().0.push(record);
    }
    fn flush(&mut self) {
        self.state.lock().unwrap().1 += 1;
    }
}

#[test]
fn records_buffer_until_timestep_bins_synchronize() {
    let state = Arc::new(Mutex::new((Vec::new(), 0u32)));
    let mut driver = FeedbackDriver::new(
        DriverConfig::default(),
        EventDeterminer::new(fixed_source(50.0), 11),
        Box::new(SharedSink {
            state: state.clone(),
        }),
    )
    .unwrap();

    // Fine bins running alone: the record buffers, nothing reaches the
    // sink.
    let desynced = StepClock {
        time: 1.0e-3,
        step: StepId(1),
        highest_active_bin: TimeBin(2),
        highest_occupied_bin: TimeBin(5),
    };
    let mut partitions = split_scene();
    driver.run_step(&mut partitions, &desynced).unwrap();
    {
        let s = state.lock().unwrap();
        assert!(s.0.is_empty());
        assert_eq!(s.1, 0);
    }

    // Synchronized step: both buffered records arrive, one flush.
    let mut partitions = split_scene();
    driver.run_step(&mut partitions, &clock(2.0e-3)).unwrap();
    {
        let s = state.lock().unwrap();
        assert_eq!(s.0.len(), 2);
        assert_eq!(s.1, 1);
        assert_eq!(s.0[0].events, 2.0);
    }
}

#[test]
fn overdrawn_source_is_permanently_disabled() {
    // The cluster reports far more ejecta than the particle's mass;
    // the deficit is a numeric degeneracy, not an error.
    let mut partitions = split_scene();
    let mut driver = driver_with(DriverConfig::default(), 1.0e12);
    let summary = driver.run_step(&mut partitions, &clock(1.0e-3)).unwrap();
    assert_eq!(summary.degenerate_sources, 1);

    let (_, star) = partitions[0].stars().iter().next().unwrap();
    assert_eq!(star.mass, 0.0);

    // The next step sees a massless particle: skipped, no events.
    let summary = driver.run_step(&mut partitions, &clock(2.0e-3)).unwrap();
    assert_eq!(summary.active_sources, 0);
    assert_eq!(summary.events, 0.0);
    assert_eq!(driver.last_metrics().skipped, 1);
}
