//! Feedback phases and event kinds.
//!
//! The original scheme encoded both "which pass of the coupling loop is
//! running" and "what kind of event is being injected" in one signed
//! loop index. Here they are two explicit enumerations: [`Phase`] orders
//! the passes, [`EventKind`] names the physics.

use std::fmt;

/// Kind of feedback event a source is injecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Discrete supernova explosions.
    Supernova,
    /// Continuous stellar-wind mass loss.
    Wind,
    /// Massless tracer outflows (diagnostics-grade coupling).
    Tracer,
}

impl EventKind {
    /// All kinds, in injection order.
    pub const ALL: [EventKind; 3] = [EventKind::Supernova, EventKind::Wind, EventKind::Tracer];

    /// Dense index for per-kind storage.
    pub fn index(self) -> usize {
        match self {
            EventKind::Supernova => 0,
            EventKind::Wind => 1,
            EventKind::Tracer => 2,
        }
    }

    /// Whether the cooling-radius estimate includes the "+1" free-expansion
    /// energy offset. True supernovae carry it; winds and tracers scale from
    /// the bare ejecta energy so the estimate degrades smoothly to zero as
    /// the mass loading vanishes.
    pub fn is_supernova(self) -> bool {
        matches!(self, EventKind::Supernova)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Supernova => "supernova",
            EventKind::Wind => "wind",
            EventKind::Tracer => "tracer",
        };
        write!(f, "{name}")
    }
}

/// One pass of the feedback coupling state machine.
///
/// Ordering is load-bearing: each phase reads weight state committed by
/// the previous one, with a full barrier (including cross-partition
/// exchange) in between.
///
/// - [`Phase::WeightCollect`] accumulates the scalar overlap and signed
///   axis terms of the directional weight vector. Neighbor state is not
///   modified.
/// - [`Phase::WeightFinalize`] accumulates the four auxiliary terms
///   (residual kinetic, momentum/energy cross, cooling-limited,
///   normalization), which require the collected terms to already be
///   complete. Neighbor state is not modified.
/// - [`Phase::Inject`] consumes the finalized weights and mutates
///   neighbor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First weighting pass: scalar + signed axis accumulation.
    WeightCollect,
    /// Second weighting pass: auxiliary term accumulation.
    WeightFinalize,
    /// Injection pass for one event kind.
    Inject(EventKind),
}

impl Phase {
    /// Whether this is one of the two weighting passes.
    pub fn is_weight(self) -> bool {
        matches!(self, Phase::WeightCollect | Phase::WeightFinalize)
    }

    /// The event kind being injected, if this is an injection pass.
    pub fn inject_kind(self) -> Option<EventKind> {
        match self {
            Phase::Inject(kind) => Some(kind),
            _ => None,
        }
    }

    /// The full ordered pass sequence for a set of injection kinds.
    pub fn sequence(kinds: &[EventKind]) -> Vec<Phase> {
        let mut phases = Vec::with_capacity(2 + kinds.len());
        phases.push(Phase::WeightCollect);
        phases.push(Phase::WeightFinalize);
        phases.extend(kinds.iter().map(|&k| Phase::Inject(k)));
        phases
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::WeightCollect => write!(f, "weight-collect"),
            Phase::WeightFinalize => write!(f, "weight-finalize"),
            Phase::Inject(kind) => write!(f, "inject-{kind}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_orders_weights_before_injection() {
        let phases = Phase::sequence(&[EventKind::Supernova, EventKind::Wind]);
        assert_eq!(
            phases,
            vec![
                Phase::WeightCollect,
                Phase::WeightFinalize,
                Phase::Inject(EventKind::Supernova),
                Phase::Inject(EventKind::Wind),
            ]
        );
    }

    #[test]
    fn weight_phases_are_flagged() {
        assert!(Phase::WeightCollect.is_weight());
        assert!(Phase::WeightFinalize.is_weight());
        assert!(!Phase::Inject(EventKind::Supernova).is_weight());
    }

    #[test]
    fn only_supernovae_carry_the_energy_offset() {
        assert!(EventKind::Supernova.is_supernova());
        assert!(!EventKind::Wind.is_supernova());
        assert!(!EventKind::Tracer.is_supernova());
    }

    #[test]
    fn kind_indices_are_dense() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }
}
