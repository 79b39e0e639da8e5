//! telemetry/counters.rs
//! Mutable counters filled in by the ordered writer.
//!
//! Converted into an immutable `TelemetrySnapshot` when the run ends.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    /// Units handed to the cipher: 1 on the in-memory path, one per chunk otherwise.
    pub chunks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl TelemetryCounters {
    /// Record one processed unit of `in_len` input and `out_len` output bytes.
    pub fn add_chunk(&mut self, in_len: usize, out_len: usize) {
        self.chunks += 1;
        self.bytes_in += in_len as u64;
        self.bytes_out += out_len as u64;
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
