//! stream: file and stream encryption over arbitrarily large inputs.
//!
//! Inputs up to `StreamConfig::max_in_memory_size` go through one
//! `CipherContext` call. Larger inputs are split into fixed-size chunks,
//! processed by a bounded worker pool, and reassembled in order. Each chunk
//! is a complete encrypt/decrypt call (own padding, chaining restarted from
//! the context IV), so chunked ciphertext is only readable by the chunked
//! decrypt path with the same chunk size.

pub mod chunk_worker;
pub mod core;
pub mod io;
pub mod parallelism;
pub mod pipeline;

pub use self::core::{
    decrypt_file, decrypt_file_with, decrypt_stream, encrypt_file, encrypt_file_with, encrypt_stream, StreamConfig,
};
pub use self::io::{InputSource, OutputSink};
pub use self::parallelism::ParallelismProfile;
pub use self::pipeline::{run_pipeline, PipelineConfig, PipelineOutcome};
