//! Per-step event diagnostics.

use cinder_arena::Partition;
use cinder_core::units::UnitSystem;

/// Per-process sums accumulated while determining events.
///
/// Merging is plain addition, so partial tallies from any number of
/// partitions reduce to one record in any order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EventTally {
    /// Sources that passed every precondition this step.
    pub candidates: f64,
    /// Sources that actually hosted at least one event.
    pub hosts: f64,
    /// Total discrete events.
    pub events: f64,
    /// Probability-weighted sum of rate × mass × dt over candidates.
    pub expected_sum: f64,
    /// Summed candidate timesteps (for the mean).
    pub dt_sum: f64,
    /// Summed candidate event rates (for the mean).
    pub rate_sum: f64,
    /// Sources rejected by a precondition (non-positive mass, dt, or
    /// age).
    pub skipped: u64,
}

impl EventTally {
    /// Merge another partition's tally into this one.
    pub fn merge(&mut self, other: &EventTally) {
        self.candidates += other.candidates;
        self.hosts += other.hosts;
        self.events += other.events;
        self.expected_sum += other.expected_sum;
        self.dt_sum += other.dt_sum;
        self.rate_sum += other.rate_sum;
        self.skipped += other.skipped;
    }

    /// Reduce to a log record, if this step produced anything worth
    /// recording: at least one candidate, one host, one event, and a
    /// positive timestep sum.
    pub fn record(&self, time: f64) -> Option<EventLogRecord> {
        if self.events > 0.0 && self.hosts > 0.0 && self.dt_sum > 0.0 && self.candidates > 0.0 {
            Some(EventLogRecord {
                time,
                candidates: self.candidates,
                hosts: self.hosts,
                events: self.events,
                expected: self.expected_sum,
                mean_dt: self.dt_sum / self.candidates,
                mean_rate: self.rate_sum / self.candidates,
            })
        } else {
            None
        }
    }
}

/// One appended diagnostics record for a step that hosted events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventLogRecord {
    /// Simulation time of the step.
    pub time: f64,
    /// Candidate source count.
    pub candidates: f64,
    /// Hosting source count.
    pub hosts: f64,
    /// Total events.
    pub events: f64,
    /// Probability-weighted expected events.
    pub expected: f64,
    /// Mean candidate timestep.
    pub mean_dt: f64,
    /// Mean candidate event rate.
    pub mean_rate: f64,
}

/// Aggregate census of the stellar population's lifetime feedback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PopulationCensus {
    /// Total stellar mass, solar masses.
    pub stellar_mass_solar: f64,
    /// Lifetime event count across the population.
    pub cumulative_events: f64,
}

impl PopulationCensus {
    /// Lifetime events per 100 solar masses formed — the standard
    /// sanity check against the adopted event rates.
    pub fn events_per_100_solar(&self) -> f64 {
        if self.stellar_mass_solar <= 0.0 {
            return 0.0;
        }
        self.cumulative_events / (self.stellar_mass_solar / 100.0)
    }
}

/// Census over every partition's live stars.
pub fn population_census(partitions: &[Partition], units: &UnitSystem) -> PopulationCensus {
    let mut census = PopulationCensus::default();
    for partition in partitions {
        for (_, star) in partition.stars().iter() {
            if star.mass <= 0.0 {
                continue;
            }
            census.stellar_mass_solar += star.mass * units.solar_per_mass();
            census.cumulative_events += star.cumulative_events;
        }
    }
    census
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::{PartitionId, Star};

    #[test]
    fn merge_adds_all_fields() {
        let a = EventTally {
            candidates: 2.0,
            hosts: 1.0,
            events: 3.0,
            expected_sum: 0.5,
            dt_sum: 0.2,
            rate_sum: 0.1,
            skipped: 4,
        };
        let mut b = a;
        b.merge(&a);
        assert_eq!(b.candidates, 4.0);
        assert_eq!(b.events, 6.0);
        assert_eq!(b.skipped, 8);
    }

    #[test]
    fn record_requires_events_and_candidates() {
        let mut tally = EventTally::default();
        assert!(tally.record(1.0).is_none());
        tally.candidates = 4.0;
        tally.dt_sum = 0.4;
        tally.rate_sum = 0.8;
        assert!(tally.record(1.0).is_none()); // no events yet
        tally.hosts = 1.0;
        tally.events = 2.0;
        let record = tally.record(1.0).unwrap();
        assert_eq!(record.mean_dt, 0.1);
        assert_eq!(record.mean_rate, 0.2);
        assert_eq!(record.events, 2.0);
    }

    #[test]
    fn census_skips_massless_sources() {
        let units = UnitSystem::galactic();
        let mut partition = Partition::new(PartitionId(0));
        let mut live = Star::new([0.0; 3], 2.0e-10, 0.0); // 2 solar masses
        live.cumulative_events = 3.0;
        partition.insert_star(live);
        let mut dead = Star::new([0.0; 3], 0.0, 0.0);
        dead.cumulative_events = 9.0;
        partition.insert_star(dead);

        let census = population_census(&[partition], &units);
        assert!((census.stellar_mass_solar - 2.0).abs() < 1e-9);
        assert_eq!(census.cumulative_events, 3.0);
        assert!((census.events_per_100_solar() - 150.0).abs() < 1e-9);
    }
}
