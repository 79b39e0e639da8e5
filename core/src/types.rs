use std::io;

use thiserror::Error;

use crate::crypto::types::CipherError;

/// Error surfaced by the file/stream API and the chunk pipeline.
/// - `From<T>` impls let `?` cross from I/O and the cipher layer.
/// - The first failure aborts the pipeline; output written so far stays.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Whole-buffer path, or setup before any chunk was dispatched.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// A chunk worker failed on chunk `index`.
    #[error("worker error on chunk {index}: {source}")]
    Worker {
        index: u64,
        #[source]
        source: CipherError,
    },

    /// Channel wiring broke or a pipeline thread panicked.
    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl StreamError {
    pub(crate) fn pipeline(msg: impl Into<String>) -> Self {
        StreamError::Pipeline(msg.into())
    }
}
