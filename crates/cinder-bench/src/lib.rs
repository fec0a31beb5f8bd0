//! Benchmark profiles for the Cinder feedback engine.
//!
//! Provides a pre-built single-source scene generator shared by the
//! Criterion benches: one armed supernova source inside a spherical gas
//! cloud of configurable neighbor count.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cinder_arena::Partition;
use cinder_core::{StepClock, StepId, TimeBin};
use cinder_test_utils::{armed_source, fibonacci_sphere, single_source_scene};

/// A partition holding one armed source at the origin and `neighbors`
/// gas particles on a shell at half the source's kernel radius.
pub fn shell_scene(neighbors: usize) -> Partition {
    let h = 0.1;
    let positions: Vec<[f64; 3]> = fibonacci_sphere(neighbors)
        .into_iter()
        .map(|d| [d[0] * h * 0.5, d[1] * h * 0.5, d[2] * h * 0.5])
        .collect();
    let (partition, _, _) = single_source_scene(
        armed_source(1.0e-9, 1.0, h),
        &positions,
        1.0e-8,
        1.0,
        h * 0.6,
    );
    partition
}

/// A synchronized step clock at the given time.
pub fn bench_clock(time: f64) -> StepClock {
    StepClock {
        time,
        step: StepId(1),
        highest_active_bin: TimeBin(0),
        highest_occupied_bin: TimeBin(0),
    }
}
