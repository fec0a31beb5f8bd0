//! Per-partition event determination.

use cinder_arena::Partition;
use cinder_core::units::UnitSystem;
use cinder_core::{Ejecta, EventKind, Star, StepClock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::rate::{sample_poisson, RateModel};
use crate::synthesis::PopulationSynthesis;
use crate::tally::EventTally;

/// Mean core-collapse ejecta mass per event, solar masses.
pub const EJECTA_MASS_PER_EVENT_SOLAR: f64 = 10.5;

/// Which machinery decides events for a determiner. Exactly one
/// applies; mixing models within a run is not supported.
pub enum EventSource {
    /// Local rate function plus seeded Poisson draws.
    Rate(RateModel),
    /// External stochastic population-synthesis engine.
    Cluster(Box<dyn PopulationSynthesis>),
}

/// Scans locally active sources and fills in their per-step event
/// state.
///
/// Owns the event source, which for the cluster variant is what makes
/// its advance-the-clock call site unique.
pub struct EventDeterminer {
    source: EventSource,
    seed: u64,
    ejecta_mass_per_event_solar: f64,
}

impl EventDeterminer {
    /// A determiner over the given source, seeded for reproducible
    /// Poisson draws.
    pub fn new(source: EventSource, seed: u64) -> Self {
        Self {
            source,
            seed,
            ejecta_mass_per_event_solar: EJECTA_MASS_PER_EVENT_SOLAR,
        }
    }

    /// Override the per-event ejecta mass (solar masses).
    pub fn with_ejecta_mass_per_event(mut self, solar: f64) -> Self {
        self.ejecta_mass_per_event_solar = solar;
        self
    }

    /// Determine events for every eligible star in one partition.
    ///
    /// Per-star preconditions (non-positive mass, timestep, or age) are
    /// counted and skipped; they never fail the step. Side effects on
    /// each hosting star: per-step event state, the lifetime event
    /// counter, and the optional remaining-massive-star budget.
    pub fn determine(
        &mut self,
        partition: &mut Partition,
        clock: &StepClock,
        units: &UnitSystem,
    ) -> EventTally {
        let mut tally = EventTally::default();
        let partition_bits = (partition.id().0 as u64) << 48;

        for (handle, star) in partition.stars_mut().iter_mut() {
            star.clear_step_state();

            if star.mass <= 0.0 || star.dt <= 0.0 {
                tally.skipped += 1;
                continue;
            }
            let age = star.age_at(clock.time);
            if age <= 0.0 {
                tally.skipped += 1;
                continue;
            }
            tally.candidates += 1.0;
            tally.dt_sum += star.dt;

            let events = match &mut self.source {
                EventSource::Cluster(engine) => {
                    advance_cluster(engine.as_mut(), star, age, units)
                }
                EventSource::Rate(model) => {
                    let seed = self.seed
                        ^ clock.step.0.rotate_left(17)
                        ^ partition_bits
                        ^ (handle.index() as u64);
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);

                    let age_myr = age * units.myr_per_time();
                    let mass_solar = star.mass * units.solar_per_mass();
                    let dt_myr = star.dt * units.myr_per_time();
                    let z_ratio =
                        star.metallicity[0] / cinder_core::units::SOLAR_METALLICITY;

                    let rate = model.expected_rate(age_myr, z_ratio);
                    let expected = rate * mass_solar * dt_myr;
                    tally.rate_sum += rate;
                    tally.expected_sum += expected;

                    let count = sample_poisson(&mut rng, expected);
                    if count > 0 {
                        let mass = count as f64 * self.ejecta_mass_per_event_solar
                            / units.solar_per_mass();
                        let energy = count as f64 * units.supernova_energy();
                        let velocity = (2.0 * energy / mass).sqrt();
                        *star.ejecta.get_mut(EventKind::Supernova) =
                            Some(Ejecta::new(mass, velocity));
                    }
                    count
                }
            };

            star.events_this_step = events;
            star.cumulative_events += events as f64;
            if let Some(remaining) = star.massive_stars_remaining {
                star.massive_stars_remaining = Some((remaining - events as f64).max(0.0));
            }
            if events > 0 {
                tally.hosts += 1.0;
                tally.events += events as f64;
            }
        }
        tally
    }
}

/// Advance one cluster through the synthesis engine and convert its
/// report into an ejecta budget. Returns the event count.
fn advance_cluster(
    engine: &mut dyn PopulationSynthesis,
    star: &mut Star,
    age: f64,
    units: &UnitSystem,
) -> u32 {
    let Some(state) = star.cluster.as_mut() else {
        // Spent cluster: inactive for event determination.
        return 0;
    };
    let age_years = age * units.years_per_time();
    let report = engine.advance_to_time(state, age_years);

    let mass = report.ejecta_mass_solar / units.solar_per_mass();
    if mass > 0.0 {
        let energy = report.events as f64 * units.supernova_energy();
        let velocity = (2.0 * energy / mass).sqrt();
        let mut ejecta = Ejecta::new(mass, velocity);
        if let Some(yields) = report.yields {
            ejecta.yields = yields;
        }
        *star.ejecta.get_mut(EventKind::Supernova) = Some(ejecta);
    }
    if report.live_stars == 0 {
        star.cluster = None;
    }
    report.events
}
