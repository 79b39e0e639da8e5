//! Chunk workers for the streaming pipeline.
//!
//! A chunk is a fixed-size slice of the input processed independently with
//! a full `CipherContext` call. Workers are:
//! - CPU-bound
//! - stateless between chunks
//! - unaware of ordering (the writer restores it)

pub mod types;
pub mod worker;

pub use types::{Chunk, OrderedResult};
pub use worker::{cipher_op, ChunkWorker};
