use sysinfo::System;
use tracing::debug;

use crate::constants::{INFLIGHT_HARD_CAP, INFLIGHT_MEM_FRACTION};

/// Parallelism configuration for the chunk pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    /// Chunk workers running cipher calls concurrently.
    pub cpu_workers: usize,
    /// Credits: chunks that may be read but not yet written.
    pub inflight_chunks: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self { cpu_workers: 1, inflight_chunks: 1 }
    }

    /// Explicit profile. The window never drops below the worker count, so
    /// every worker can hold a chunk.
    pub fn new(cpu_workers: usize, inflight_chunks: usize) -> Self {
        let cpu_workers = cpu_workers.max(1);
        Self { cpu_workers, inflight_chunks: inflight_chunks.max(cpu_workers) }
    }

    /// One worker per logical CPU; the inflight window is the number of
    /// `chunk_size` buffers that fit in `mem_fraction` of available memory,
    /// capped at `hard_cap`.
    pub fn dynamic(chunk_size: u64, mem_fraction: f64, hard_cap: usize) -> Self {
        let cpu_workers = num_cpus::get().max(1);

        let mut sys = System::new();
        sys.refresh_memory();
        let avail_bytes = sys.available_memory();

        let budget = (avail_bytes as f64 * mem_fraction) as u64;
        // Each inflight chunk holds an input and an output buffer.
        let per_chunk = chunk_size.max(1).saturating_mul(2);
        let fit = (budget / per_chunk).min(hard_cap as u64) as usize;

        let profile = Self::new(cpu_workers, fit);
        debug!(
            cpu_workers = profile.cpu_workers,
            inflight_chunks = profile.inflight_chunks,
            avail_bytes,
            "parallelism profile"
        );
        profile
    }

    pub fn for_chunk_size(chunk_size: usize) -> Self {
        Self::dynamic(chunk_size as u64, INFLIGHT_MEM_FRACTION, INFLIGHT_HARD_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_to_sane_minimums() {
        assert_eq!(ParallelismProfile::new(0, 0), ParallelismProfile { cpu_workers: 1, inflight_chunks: 1 });
        assert_eq!(ParallelismProfile::new(4, 2).inflight_chunks, 4);
        assert_eq!(ParallelismProfile::new(2, 16).inflight_chunks, 16);
    }

    #[test]
    fn dynamic_respects_hard_cap() {
        let p = ParallelismProfile::dynamic(1024, 0.5, 3);
        assert!(p.cpu_workers >= 1);
        assert!(p.inflight_chunks >= p.cpu_workers);
        assert!(p.inflight_chunks <= p.cpu_workers.max(3));
    }
}
