//! Event determination: which sources release feedback this step.
//!
//! Exactly one event source applies per determiner, chosen at
//! construction:
//!
//! - [`RateModel`] — a local function of age, mass, and metallicity
//!   gives an expected event rate, converted to a count by a seeded
//!   Poisson draw.
//! - [`PopulationSynthesis`] — an external stochastic engine advances
//!   opaque per-particle cluster state and reports discrete events.
//!
//! The synthesis engine's internal clock may only ever be advanced from
//! [`EventDeterminer::determine`]; the determiner owning the boxed
//! capability is what enforces that structurally.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod determiner;
mod rate;
mod synthesis;
mod tally;

pub use determiner::{EventDeterminer, EventSource};
pub use rate::RateModel;
pub use synthesis::{ClusterStep, PopulationSynthesis};
pub use tally::{population_census, EventLogRecord, EventTally, PopulationCensus};
