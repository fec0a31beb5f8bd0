//! Neighbor search for the Cinder feedback engine.
//!
//! [`NeighborSearch`] is the interface the coupling evaluator walks
//! neighbors through; [`CellGrid`] is the reference backend, a uniform
//! hash grid over one partition's gas built once per step. The search
//! is "pairwise": a candidate is reported when it lies within the
//! query's kernel *or* the query point lies within the candidate's own
//! kernel, so mutual-kernel couplings are found in both directions.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use cinder_arena::Partition;
use cinder_core::{vec3, GasId, SearchError};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Range query over one partition's gas.
///
/// Candidate order is unspecified. Implementations report every gas
/// particle within `max(h, h_candidate)` of `position`; they may also
/// report extra candidates (the evaluator re-checks the pair criterion),
/// but must never omit one. Any error is fatal for the feedback step.
pub trait NeighborSearch {
    /// Append all pair candidates around `position` with query kernel
    /// extent `h` to `out`. `out` is not cleared first.
    fn query_pairs(
        &self,
        position: [f64; 3],
        h: f64,
        out: &mut Vec<GasId>,
    ) -> Result<(), SearchError>;
}

/// Key of one grid cell.
type CellKey = [i64; 3];

/// Uniform hash-grid over a gas snapshot.
///
/// Built from positions and smoothing lengths at phase entry; feedback
/// phases mutate velocities, masses, and energies but never positions,
/// so one build per step stays valid for every pass. Cell size is the
/// largest gas smoothing length, which makes the pairwise criterion a
/// one-cell-ring walk plus the query's own extent.
#[derive(Clone, Debug)]
pub struct CellGrid {
    entries: Vec<Entry>,
    cells: IndexMap<CellKey, SmallVec<[u32; 8]>>,
    cell_size: f64,
    max_smoothing: f64,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: GasId,
    position: [f64; 3],
    smoothing_length: f64,
}

impl CellGrid {
    /// Build a grid over the partition's live gas.
    pub fn build(partition: &Partition) -> Self {
        let mut entries = Vec::with_capacity(partition.gas().len());
        let mut max_smoothing = 0.0f64;
        for (id, gas) in partition.gas().iter() {
            max_smoothing = max_smoothing.max(gas.smoothing_length);
            entries.push(Entry {
                id,
                position: gas.position,
                smoothing_length: gas.smoothing_length,
            });
        }
        // Degenerate smoothing lengths still need a usable cell size.
        let cell_size = if max_smoothing > 0.0 {
            max_smoothing
        } else {
            1.0
        };
        let mut cells: IndexMap<CellKey, SmallVec<[u32; 8]>> = IndexMap::new();
        for (i, entry) in entries.iter().enumerate() {
            let key = Self::key_of(entry.position, cell_size);
            cells.entry(key).or_default().push(i as u32);
        }
        Self {
            entries,
            cells,
            cell_size,
            max_smoothing,
        }
    }

    /// The largest gas smoothing length in the snapshot.
    pub fn max_smoothing(&self) -> f64 {
        self.max_smoothing
    }

    /// Number of indexed gas particles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the grid indexes no particles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key_of(position: [f64; 3], cell_size: f64) -> CellKey {
        [
            (position[0] / cell_size).floor() as i64,
            (position[1] / cell_size).floor() as i64,
            (position[2] / cell_size).floor() as i64,
        ]
    }

    fn push_matches(&self, indices: &[u32], position: [f64; 3], h: f64, out: &mut Vec<GasId>) {
        for &i in indices {
            let entry = &self.entries[i as usize];
            let r2 = vec3::norm_squared(vec3::sub(position, entry.position));
            let reach = h.max(entry.smoothing_length);
            if r2 <= reach * reach {
                out.push(entry.id);
            }
        }
    }
}

impl NeighborSearch for CellGrid {
    fn query_pairs(
        &self,
        position: [f64; 3],
        h: f64,
        out: &mut Vec<GasId>,
    ) -> Result<(), SearchError> {
        if !h.is_finite() || position.iter().any(|c| !c.is_finite()) {
            return Err(SearchError::NonFiniteQuery { radius: h });
        }
        if self.entries.is_empty() {
            return Ok(());
        }
        // The walk must cover the query extent and the largest candidate
        // kernel reaching back toward the query point.
        let reach = h.max(self.max_smoothing);
        let cells_out = ((reach / self.cell_size).ceil() as i64).clamp(1, 64);

        // Walking more cells than there are particles is a loss; scan
        // the flat list instead.
        let ring = ((2 * cells_out + 1) as usize).pow(3);
        if reach / self.cell_size > 64.0
            || ring >= self.entries.len()
            || ring > self.cells.len() * 27
        {
            let all: Vec<u32> = (0..self.entries.len() as u32).collect();
            self.push_matches(&all, position, h, out);
            return Ok(());
        }

        let center = Self::key_of(position, self.cell_size);
        for dx in -cells_out..=cells_out {
            for dy in -cells_out..=cells_out {
                for dz in -cells_out..=cells_out {
                    let key = [center[0] + dx, center[1] + dy, center[2] + dz];
                    if let Some(indices) = self.cells.get(&key) {
                        self.push_matches(indices, position, h, out);
                    }
                }
            }
        }
        Ok(())
    }
}
