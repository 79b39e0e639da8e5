//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for file/stream runs.
//!
//! Every `encrypt_*`/`decrypt_*` call in `stream` returns a
//! `TelemetrySnapshot`, whichever path (in-memory or chunked) it took.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
