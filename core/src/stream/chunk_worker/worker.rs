use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use super::types::{Chunk, OrderedResult};
use crate::context::CipherContext;
use crate::crypto::types::CipherError;
use crate::telemetry::Direction;
use crate::types::StreamError;

/// Per-chunk cipher call for `direction`.
///
/// Block-level fan-out is switched off: the pipeline already runs one
/// worker per core, and nesting both would oversubscribe the CPU.
pub fn cipher_op(
    ctx: &CipherContext,
    direction: Direction,
) -> impl Fn(&Chunk) -> Result<Vec<u8>, CipherError> + Sync {
    let ctx = ctx.clone().with_block_workers(1);
    move |chunk: &Chunk| match direction {
        Direction::Encrypt => ctx.encrypt(&chunk.payload),
        Direction::Decrypt => ctx.decrypt(&chunk.payload),
    }
}

pub struct ChunkWorker<'f, F> {
    id: usize,
    op: &'f F,
}

impl<'f, F> ChunkWorker<'f, F>
where
    F: Fn(&Chunk) -> Result<Vec<u8>, CipherError> + Sync,
{
    pub fn new(id: usize, op: &'f F) -> Self {
        Self { id, op }
    }

    /// Run one chunk. A panic inside the operation becomes an error result
    /// so the writer still hears about the chunk and the pipeline unwinds.
    pub fn process(&self, chunk: &Chunk) -> OrderedResult {
        let start = Instant::now();
        let index = chunk.index;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| (self.op)(chunk))) {
            Ok(res) => res.map_err(|source| StreamError::Worker { index, source }),
            Err(_) => {
                warn!(worker = self.id, index, "chunk operation panicked");
                Err(StreamError::pipeline(format!("chunk operation panicked on chunk {index}")))
            }
        };
        let elapsed = start.elapsed();
        trace!(worker = self.id, index, ok = result.is_ok(), ?elapsed, "chunk processed");

        OrderedResult { index, input_len: chunk.payload.len(), result, elapsed }
    }

    /// Consume chunks until the input channel closes or the writer hangs up.
    /// Failures are forwarded as results; the writer decides to abort.
    pub fn run(self, rx: Receiver<Chunk>, tx: Sender<OrderedResult>) {
        debug!(worker = self.id, "chunk worker starting");
        for chunk in rx.iter() {
            if tx.send(self.process(&chunk)).is_err() {
                debug!(worker = self.id, "writer gone, worker exiting");
                return;
            }
        }
        debug!(worker = self.id, "input closed, worker exiting");
    }
}
