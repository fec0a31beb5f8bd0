//! Driver configuration and validation.

use cinder_core::units::UnitSystem;
use cinder_core::EventKind;
use cinder_coupling::CouplingParams;

use std::error::Error;
use std::fmt;

/// Configuration for a [`FeedbackDriver`](crate::FeedbackDriver).
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Knobs of the coupling engine.
    pub coupling: CouplingParams,
    /// The internal unit system.
    pub units: UnitSystem,
    /// Event kinds to inject, in pass order. Must be non-empty and
    /// free of duplicates.
    pub inject_kinds: Vec<EventKind>,
    /// Run each phase's exchange with one worker thread per partition
    /// instead of sequentially.
    pub threaded: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            coupling: CouplingParams::default(),
            units: UnitSystem::galactic(),
            inject_kinds: vec![EventKind::Supernova],
            threaded: false,
        }
    }
}

impl DriverConfig {
    /// Check structural invariants. Run once at driver construction.
    pub fn validate(&self) -> Result<(), DriverConfigError> {
        if self.inject_kinds.is_empty() {
            return Err(DriverConfigError::NoInjectKinds);
        }
        for (i, kind) in self.inject_kinds.iter().enumerate() {
            if self.inject_kinds[..i].contains(kind) {
                return Err(DriverConfigError::DuplicateInjectKind { kind: *kind });
            }
        }
        Ok(())
    }
}

/// Errors detected during [`DriverConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverConfigError {
    /// No injection kinds configured; the step would do nothing.
    NoInjectKinds,
    /// The same kind appears twice in the pass order.
    DuplicateInjectKind {
        /// The repeated kind.
        kind: EventKind,
    },
}

impl fmt::Display for DriverConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInjectKinds => write!(f, "no injection kinds configured"),
            Self::DuplicateInjectKind { kind } => {
                write!(f, "injection kind '{kind}' configured twice")
            }
        }
    }
}

impl Error for DriverConfigError {}
