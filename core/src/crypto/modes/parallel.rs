//! Scoped fan-out of independent block operations.
//!
//! Work is cut into contiguous runs of whole blocks, one run per worker.
//! Every worker reads its own input run and writes its own disjoint output
//! run, so the final buffer needs no reassembly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::trace;

use crate::constants::PARALLEL_MIN_BLOCKS;
use crate::crypto::types::CipherError;

/// Number of threads actually used for `blocks` blocks with `workers` allowed.
pub fn effective_workers(blocks: usize, workers: usize) -> usize {
    if workers <= 1 || blocks < PARALLEL_MIN_BLOCKS {
        1
    } else {
        workers.min(blocks)
    }
}

/// Apply `op(block_index, input_block, output_block)` to every block.
///
/// `input` and `output` must have the same length, a multiple of
/// `block_size`. When a worker fails the others stop at their next block and
/// the error from the lowest-indexed failing run is returned.
pub fn map_blocks<F>(
    input: &[u8],
    output: &mut [u8],
    block_size: usize,
    workers: usize,
    op: F,
) -> Result<(), CipherError>
where
    F: Fn(usize, &[u8], &mut [u8]) -> Result<(), CipherError> + Sync,
{
    debug_assert_eq!(input.len(), output.len());
    let blocks = input.len() / block_size;
    let threads = effective_workers(blocks, workers);

    if threads == 1 {
        for (i, (src, dst)) in input
            .chunks_exact(block_size)
            .zip(output.chunks_exact_mut(block_size))
            .enumerate()
        {
            op(i, src, dst)?;
        }
        return Ok(());
    }

    let per_worker = blocks.div_ceil(threads);
    let span = per_worker * block_size;
    let failed = AtomicBool::new(false);
    let (op, failed) = (&op, &failed);

    trace!(blocks, threads, per_worker, "fan-out");

    thread::scope(|scope| {
        let handles: Vec<_> = input
            .chunks(span)
            .zip(output.chunks_mut(span))
            .enumerate()
            .map(|(w, (src_run, dst_run))| {
                scope.spawn(move || -> Result<(), CipherError> {
                    let base = w * per_worker;
                    for (j, (src, dst)) in src_run
                        .chunks_exact(block_size)
                        .zip(dst_run.chunks_exact_mut(block_size))
                        .enumerate()
                    {
                        if failed.load(Ordering::Relaxed) {
                            return Ok(());
                        }
                        if let Err(e) = op(base + j, src, dst) {
                            failed.store(true, Ordering::Relaxed);
                            return Err(e);
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        let mut first_err = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        first_err.map_or(Ok(()), Err)
    })
}
