//! Particle storage for the Cinder feedback engine.
//!
//! Each partition owns an explicit [`Arena`] of records with stable
//! generational handles: handles to removed particles resolve to
//! `None` instead of silently aliasing a reused slot, which a raw
//! integer-indexed particle table cannot guarantee.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod arena;
mod partition;

pub use arena::Arena;
pub use partition::Partition;
