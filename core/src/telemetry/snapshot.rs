//! telemetry/snapshot.rs
//! Immutable record of one file/stream run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

/// Which route a run took through `stream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingPath {
    /// One whole-buffer cipher call.
    InMemory,
    /// Chunked reader/worker/writer pipeline.
    Streamed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub direction: Direction,
    pub path: ProcessingPath,
    pub chunks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
    /// Captured output, present only for `OutputSink::Memory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<u8>>,
}

impl TelemetrySnapshot {
    pub fn from(
        counters: &TelemetryCounters,
        timer: &TelemetryTimer,
        direction: Direction,
        path: ProcessingPath,
    ) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_in as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            direction,
            path,
            chunks: counters.chunks,
            bytes_in: counters.bytes_in,
            bytes_out: counters.bytes_out,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
            output: None,
        }
    }

    pub fn attach_output(&mut self, buf: Vec<u8>) {
        self.output = Some(buf);
    }

    /// Stages a finished run of this direction must have recorded.
    pub fn expected_stages(&self) -> [Stage; 3] {
        match self.direction {
            Direction::Encrypt => [Stage::Read, Stage::Encrypt, Stage::Write],
            Direction::Decrypt => [Stage::Read, Stage::Decrypt, Stage::Write],
        }
    }

    pub fn has_all_stages(&self) -> bool {
        self.stage_times.has_all(&self.expected_stages())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
