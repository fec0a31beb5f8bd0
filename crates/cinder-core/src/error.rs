//! Error types for the Cinder feedback engine.
//!
//! Organized by subsystem: neighbor search, cross-partition exchange,
//! and the feedback step itself. Per-particle precondition skips and
//! numeric degeneracies are not errors — they are counted in step
//! metrics and otherwise invisible.

use std::error::Error;
use std::fmt;

use crate::id::PartitionId;

/// Errors from a neighbor-search backend.
///
/// Any search error is fatal for the feedback step: there is no retry
/// and no partial commit.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchError {
    /// The query position or radius was NaN or infinite.
    NonFiniteQuery {
        /// The offending radius value.
        radius: f64,
    },
    /// The backend reported an internal failure.
    Backend {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteQuery { radius } => {
                write!(f, "non-finite neighbor query (radius {radius})")
            }
            Self::Backend { reason } => write!(f, "search backend failed: {reason}"),
        }
    }
}

impl Error for SearchError {}

/// Errors from the scatter/evaluate/gather exchange.
#[derive(Clone, Debug, PartialEq)]
pub enum ExchangeError {
    /// An evaluator failed while processing a partition's gas.
    SearchFailed {
        /// The partition whose evaluation failed.
        partition: PartitionId,
        /// The underlying search failure.
        reason: SearchError,
    },
    /// A partition worker disappeared without reporting results.
    WorkerLost {
        /// The partition whose worker was lost.
        partition: PartitionId,
    },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchFailed { partition, reason } => {
                write!(f, "evaluation failed on partition {partition}: {reason}")
            }
            Self::WorkerLost { partition } => {
                write!(f, "worker for partition {partition} lost")
            }
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SearchFailed { reason, .. } => Some(reason),
            Self::WorkerLost { .. } => None,
        }
    }
}

/// Errors that abort an entire feedback step.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedbackError {
    /// A coupling phase's exchange failed. The step is abandoned with
    /// no retry; state mutated by completed phases stands, state of the
    /// failed phase is not merged.
    Exchange(ExchangeError),
}

impl fmt::Display for FeedbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exchange(e) => write!(f, "feedback step aborted: {e}"),
        }
    }
}

impl Error for FeedbackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Exchange(e) => Some(e),
        }
    }
}

impl From<ExchangeError> for FeedbackError {
    fn from(e: ExchangeError) -> Self {
        Self::Exchange(e)
    }
}
