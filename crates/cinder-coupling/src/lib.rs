//! The two-stage weighted-kernel coupling engine.
//!
//! A single per-(source, phase) evaluator walks the source's gas
//! neighbors with shared kernel math; the phase selects what happens at
//! each pair:
//!
//! - weight collection accumulates the anisotropic solid-angle weights,
//! - weight finalization derives the corrected momentum directions and
//!   the auxiliary energy terms,
//! - injection deposits ejecta mass, momentum, and energy under exact
//!   mass/momentum conservation, with a configurable momentum boost
//!   modeling the unresolved energy-conserving/snowplow transition.
//!
//! Effects on remotely owned gas never happen here directly; the
//! evaluator only mutates the partition it is handed, and source-side
//! deltas travel back as [`CoupleOutput`] records.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boost;
pub mod cooling;
pub mod density;
pub mod direction;
pub mod engine;
pub mod records;

pub use boost::{BoostInputs, BoostModel, SourceCorrection};
pub use cooling::{annulus_scales, base_cooling_radius, CoolingScales};
pub use density::constant_volume_rescale;
pub use direction::corrected_direction;
pub use engine::{CouplingEngine, CouplingParams};
pub use records::{CoupleOutput, SourceInput};

/// Threshold below which an accumulated weight is treated as zero.
///
/// Guards divisions by weight sums; anything at or below this level is
/// numerically indistinguishable from an empty accumulator.
pub const MIN_WEIGHT: f64 = 1.0e-37;
