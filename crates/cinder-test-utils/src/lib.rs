//! Test fixtures for Cinder development.
//!
//! Deterministic particle configurations used across the workspace's
//! test suites: a ready-to-fire feedback source, regular neighbor
//! shells, and single-partition scenes.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use cinder_arena::Partition;
use cinder_core::{Ejecta, EventKind, Gas, GasId, PartitionId, Star, StarId};

/// A star at the origin that passes every feedback precondition, with a
/// supernova ejecta budget already assigned.
///
/// `ejecta_mass` and `ejecta_velocity` are in internal units.
pub fn armed_source(ejecta_mass: f64, ejecta_velocity: f64, smoothing_length: f64) -> Star {
    let mut star = Star::new([0.0; 3], 1.0, 0.0);
    star.smoothing_length = smoothing_length;
    star.neighbor_count = 32.0;
    star.local_gas_density = 1.0;
    star.dt = 0.1;
    star.events_this_step = 1;
    *star.ejecta.get_mut(EventKind::Supernova) = Some(Ejecta::new(ejecta_mass, ejecta_velocity));
    star
}

/// `n` unit directions distributed near-uniformly over the sphere
/// (Fibonacci lattice). Deterministic.
pub fn fibonacci_sphere(n: usize) -> Vec<[f64; 3]> {
    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f64;
            [r * theta.cos(), y, r * theta.sin()]
        })
        .collect()
}

/// One partition holding `source` at the origin plus one gas particle
/// of the given mass/density/smoothing length at each position.
pub fn single_source_scene(
    source: Star,
    gas_positions: &[[f64; 3]],
    gas_mass: f64,
    gas_density: f64,
    gas_smoothing: f64,
) -> (Partition, StarId, Vec<GasId>) {
    let mut partition = Partition::new(PartitionId(0));
    let star_id = partition.insert_star(source);
    let gas_ids = gas_positions
        .iter()
        .map(|&pos| partition.insert_gas(Gas::new(pos, gas_mass, gas_density, gas_smoothing)))
        .collect();
    (partition, star_id, gas_ids)
}

/// Total momentum of every particle in the given partitions.
pub fn total_momentum(partitions: &[Partition]) -> [f64; 3] {
    let mut p = [0.0; 3];
    for partition in partitions {
        for (_, star) in partition.stars().iter() {
            for axis in 0..3 {
                p[axis] += star.mass * star.velocity[axis];
            }
        }
        for (_, gas) in partition.gas().iter() {
            for axis in 0..3 {
                p[axis] += gas.mass * gas.velocity[axis];
            }
        }
    }
    p
}

/// Total mass of every particle in the given partitions.
pub fn total_mass(partitions: &[Partition]) -> f64 {
    let mut m = 0.0;
    for partition in partitions {
        for (_, star) in partition.stars().iter() {
            m += star.mass;
        }
        for (_, gas) in partition.gas().iter() {
            m += gas.mass;
        }
    }
    m
}
