//! Cinder: mechanical stellar-feedback coupling for particle simulations.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Cinder sub-crates. For most users, adding `cinder` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cinder::prelude::*;
//!
//! // One partition: a young stellar population surrounded by gas.
//! let mut partition = Partition::new(PartitionId(0));
//! let mut star = Star::new([0.0; 3], 1.0e-4, 0.0);
//! star.smoothing_length = 0.1;
//! star.neighbor_count = 32.0;
//! star.local_gas_density = 1.0;
//! star.dt = 1.0e-4;
//! partition.insert_star(star);
//! partition.insert_gas(Gas::new([0.05, 0.0, 0.0], 1.0e-6, 1.0, 0.05));
//!
//! // A driver with the default supernova-only pass order.
//! let determiner = EventDeterminer::new(EventSource::Rate(RateModel::default()), 42);
//! let mut driver = FeedbackDriver::new(
//!     DriverConfig::default(),
//!     determiner,
//!     Box::new(MemorySink::new()),
//! )
//! .unwrap();
//!
//! let clock = StepClock {
//!     time: 5.0e-3,
//!     step: StepId(1),
//!     highest_active_bin: TimeBin(0),
//!     highest_occupied_bin: TimeBin(0),
//! };
//! let summary = driver.run_step(&mut [partition], &clock).unwrap();
//! assert!(summary.coupled_mass >= 0.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cinder-core` | Particle records, IDs, phases, units, errors |
//! | [`arena`] | `cinder-arena` | Generational arenas and partitions |
//! | [`kernel`] | `cinder-kernel` | Smoothing-kernel and face-area math |
//! | [`search`] | `cinder-search` | Neighbor-search trait and cell grid |
//! | [`exchange`] | `cinder-exchange` | Scatter/evaluate/gather runners |
//! | [`events`] | `cinder-events` | Event determination and diagnostics tallies |
//! | [`coupling`] | `cinder-coupling` | Weight accumulation and injection engine |
//! | [`driver`] | `cinder-driver` | Pass-ordered step driver, metrics, sink |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Particle records, IDs, phases, units, and errors (`cinder-core`).
pub use cinder_core as types;

/// Generational arenas and partition ownership (`cinder-arena`).
pub use cinder_arena as arena;

/// Smoothing-kernel evaluation and face-area weights (`cinder-kernel`).
pub use cinder_kernel as kernel;

/// Neighbor-search interface and the cell-grid backend
/// (`cinder-search`).
pub use cinder_search as search;

/// Cross-partition scatter/evaluate/gather (`cinder-exchange`).
pub use cinder_exchange as exchange;

/// Event determination: rate model and population synthesis
/// (`cinder-events`).
pub use cinder_events as events;

/// The weighted-kernel coupling engine (`cinder-coupling`).
pub use cinder_coupling as coupling;

/// The pass-ordered feedback step driver (`cinder-driver`).
pub use cinder_driver as driver;

/// Common imports for typical Cinder usage.
///
/// ```rust
/// use cinder::prelude::*;
/// ```
pub mod prelude {
    // Core records and IDs
    pub use cinder_core::{
        ClusterState, Ejecta, EventKind, Gas, GasId, KernelWeights, PartitionId, Phase, Star,
        StarId, StepClock, StepId, TimeBin, UnitSystem,
    };

    // Errors
    pub use cinder_core::{ExchangeError, FeedbackError, SearchError};

    // Storage
    pub use cinder_arena::{Arena, Partition};

    // Search
    pub use cinder_search::{CellGrid, NeighborSearch};

    // Events
    pub use cinder_events::{
        EventDeterminer, EventSource, PopulationSynthesis, RateModel,
    };

    // Coupling
    pub use cinder_coupling::{BoostModel, CouplingEngine, CouplingParams};

    // Driver
    pub use cinder_driver::{
        DiagnosticsSink, DriverConfig, FeedbackDriver, MemorySink, StepMetrics, StepSummary,
    };
}
