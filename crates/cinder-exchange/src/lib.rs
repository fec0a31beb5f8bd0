//! Cross-partition scatter/evaluate/gather.
//!
//! One generic operation replaces the original's macro-driven
//! three-phase communication block: snapshot an input record for every
//! active source, evaluate it against each partition's locally owned
//! gas, and merge the per-partition output records back into the owning
//! source. The merge is plain addition of deltas, so the order in which
//! partitions report cannot change which totals are reachable — and for
//! reproducibility both runners additionally merge in ascending
//! partition order.
//!
//! Two runners share one semantics: [`run_sequential`] for a single
//! thread, [`run_threaded`] with one scoped worker per partition and
//! result shipping over `crossbeam-channel`. A worker only ever mutates
//! the partition it owns.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use cinder_arena::Partition;
use cinder_core::{ExchangeError, SearchError, Star, StarId};

/// A pairwise operation evaluated for every active source against every
/// partition.
///
/// `evaluate` may mutate the partition it is handed (injection passes
/// do; weighting passes do not), but it is only ever handed a partition
/// its caller owns for the duration of the call, so no synchronization
/// is needed inside implementations.
pub trait PairwiseOp: Sync {
    /// Immutable snapshot of the source state a remote evaluator needs.
    type Input: Clone + Send + Sync;
    /// Deltas to merge back into the owning source.
    type Output: Send;

    /// Whether this source participates in the current pass.
    fn is_active(&self, star: &Star) -> bool;

    /// Snapshot the input record for an active source.
    fn load(&self, star: &Star) -> Self::Input;

    /// Evaluate one input against one partition's gas.
    ///
    /// A search failure here aborts the whole exchange.
    fn evaluate(
        &self,
        input: &Self::Input,
        partition: &mut Partition,
    ) -> Result<Self::Output, SearchError>;

    /// Merge a second output into an accumulator. Must be commutative
    /// and associative: partition evaluation order is unspecified.
    fn merge(acc: &mut Self::Output, other: Self::Output);

    /// Apply the fully merged output to the owning source.
    fn apply(&self, star: &mut Star, output: Self::Output);
}

/// `(owning partition index, star handle, input)` for one active source.
type Loaded<I> = (usize, StarId, I);

fn collect_inputs<Op: PairwiseOp>(op: &Op, partitions: &[Partition]) -> Vec<Loaded<Op::Input>> {
    let mut inputs = Vec::new();
    for (pi, partition) in partitions.iter().enumerate() {
        for (sid, star) in partition.stars().iter() {
            if op.is_active(star) {
                inputs.push((pi, sid, op.load(star)));
            }
        }
    }
    inputs
}

fn apply_outputs<Op: PairwiseOp>(
    op: &Op,
    partitions: &mut [Partition],
    inputs: Vec<Loaded<Op::Input>>,
    outputs: Vec<Op::Output>,
) {
    debug_assert_eq!(inputs.len(), outputs.len());
    for ((pi, sid, _), output) in inputs.into_iter().zip(outputs) {
        if let Some(star) = partitions[pi].stars_mut().get_mut(sid) {
            op.apply(star, output);
        }
    }
}

/// Reduce per-partition result vectors in ascending partition order.
fn reduce<Op: PairwiseOp>(
    mut per_partition: Vec<Vec<Op::Output>>,
    input_count: usize,
) -> Vec<Op::Output> {
    let mut merged: Vec<Op::Output> = Vec::with_capacity(input_count);
    if per_partition.is_empty() {
        return merged;
    }
    // Seed with partition 0, then fold the rest in order.
    let first = per_partition.remove(0);
    merged.extend(first);
    for outputs in per_partition {
        for (acc, out) in merged.iter_mut().zip(outputs) {
            Op::merge(acc, out);
        }
    }
    merged
}

/// Run the exchange on the calling thread.
///
/// Returns the number of active sources processed.
pub fn run_sequential<Op: PairwiseOp>(
    op: &Op,
    partitions: &mut [Partition],
) -> Result<usize, ExchangeError> {
    let inputs = collect_inputs(op, partitions);
    if inputs.is_empty() {
        return Ok(0);
    }

    let mut per_partition: Vec<Vec<Op::Output>> = Vec::with_capacity(partitions.len());
    for partition in partitions.iter_mut() {
        let id = partition.id();
        let mut outputs = Vec::with_capacity(inputs.len());
        for (_, _, input) in &inputs {
            let out = op
                .evaluate(input, partition)
                .map_err(|reason| ExchangeError::SearchFailed {
                    partition: id,
                    reason,
                })?;
            outputs.push(out);
        }
        per_partition.push(outputs);
    }

    let count = inputs.len();
    let merged = reduce::<Op>(per_partition, count);
    apply_outputs(op, partitions, inputs, merged);
    Ok(count)
}

/// Run the exchange with one worker thread per partition.
///
/// Each worker evaluates the full input set against the single partition
/// it owns, then ships its output vector back for ordered reduction.
/// Identical results to [`run_sequential`] for the same inputs.
pub fn run_threaded<Op: PairwiseOp>(
    op: &Op,
    partitions: &mut [Partition],
) -> Result<usize, ExchangeError> {
    let inputs = collect_inputs(op, partitions);
    if inputs.is_empty() {
        return Ok(0);
    }

    let n_partitions = partitions.len();
    let mut slots: Vec<Option<Result<Vec<Op::Output>, ExchangeError>>> = Vec::new();
    slots.resize_with(n_partitions, || None);

    std::thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::unbounded();
        for (pi, partition) in partitions.iter_mut().enumerate() {
            let tx = tx.clone();
            let inputs = &inputs;
            scope.spawn(move || {
                let id = partition.id();
                let mut outputs = Vec::with_capacity(inputs.len());
                let mut failure = None;
                for (_, _, input) in inputs {
                    match op.evaluate(input, partition) {
                        Ok(out) => outputs.push(out),
                        Err(reason) => {
                            failure = Some(ExchangeError::SearchFailed {
                                partition: id,
                                reason,
                            });
                            break;
                        }
                    }
                }
                let result = match failure {
                    Some(err) => Err(err),
                    None => Ok(outputs),
                };
                // The receiver outlives the scope; a send failure means
                // the parent already gave up on this exchange.
                let _ = tx.send((pi, result));
            });
        }
        drop(tx);
        for _ in 0..n_partitions {
            match rx.recv() {
                Ok((pi, result)) => slots[pi] = Some(result),
                Err(_) => break,
            }
        }
    });

    let mut per_partition = Vec::with_capacity(n_partitions);
    for (pi, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(Ok(outputs)) => per_partition.push(outputs),
            Some(Err(err)) => return Err(err),
            None => {
                return Err(ExchangeError::WorkerLost {
                    partition: partitions[pi].id(),
                })
            }
        }
    }

    let count = inputs.len();
    let merged = reduce::<Op>(per_partition, count);
    apply_outputs(op, partitions, inputs, merged);
    Ok(count)
}
