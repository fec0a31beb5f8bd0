//! Core types for the Cinder stellar-feedback engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Cinder workspace:
//! particle records, typed IDs, phase and event enumerations, the unit
//! system, directional weight accumulators, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod error;
pub mod id;
pub mod particle;
pub mod phase;
pub mod units;
pub mod vec3;
pub mod weights;

pub use clock::StepClock;
pub use error::{ExchangeError, FeedbackError, SearchError};
pub use id::{GasId, Handle, PartitionId, RawHandle, StarId, StepId, TimeBin};
pub use particle::{ClusterState, Ejecta, Gas, PerKind, Star, METAL_SPECIES};
pub use phase::{EventKind, Phase};
pub use units::UnitSystem;
pub use weights::KernelWeights;
