use std::time::Duration;

use bytes::Bytes;

use crate::types::StreamError;

/// One slice of the input, tagged with its position in the stream.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: u64,
    pub payload: Bytes,
}

/// What a worker hands back to the ordered writer. A failed chunk carries
/// `StreamError::Worker` (cipher failure) or `StreamError::Pipeline` (the
/// chunk operation panicked).
#[derive(Debug)]
pub struct OrderedResult {
    pub index: u64,
    pub input_len: usize,
    pub result: Result<Vec<u8>, StreamError>,
    pub elapsed: Duration,
}
