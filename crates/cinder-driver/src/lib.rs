//! The feedback step driver.
//!
//! [`FeedbackDriver`] runs one feedback step as an ordered sequence of
//! phases — weight collection, weight finalization, then one injection
//! pass per configured event kind — with a full barrier between phases:
//! every partition's outputs are merged back into their owners before
//! the next phase loads its inputs. A neighbor-search failure aborts
//! the step fatally; there is no retry and no partial commit of the
//! failed phase.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod config;
mod driver;
mod metrics;
mod sink;

pub use config::{DriverConfig, DriverConfigError};
pub use driver::{FeedbackDriver, StepSummary};
pub use metrics::StepMetrics;
pub use sink::{DiagnosticsSink, MemorySink};
