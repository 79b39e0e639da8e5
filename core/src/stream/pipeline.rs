//! Pure pipeline wiring (no cipher logic).
//!
//! reader thread ──chunks──▶ N chunk workers ──results──▶ ordered writer
//!       ▲                                                    │
//!       └──────────────────── credits ───────────────────────┘
//!
//! The reader takes a credit before dispatching each chunk and the writer
//! returns one per chunk it flushes, so at most `inflight_chunks` chunks are
//! read but unwritten at any time. That bounds both channels and the
//! writer's reorder map, even when one worker stalls.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::constants::STREAM_CHUNK_SIZE;
use crate::context::CipherContext;
use crate::crypto::types::CipherError;
use crate::stream::chunk_worker::{cipher_op, Chunk, ChunkWorker, OrderedResult};
use crate::stream::io::{read_exact_or_eof, OrderedChunkWriter};
use crate::stream::parallelism::ParallelismProfile;
use crate::telemetry::{Direction, Stage, TelemetryCounters, TelemetryTimer};
use crate::types::StreamError;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bytes per chunk handed to a worker.
    pub chunk_size: usize,
    pub profile: ParallelismProfile,
}

impl PipelineConfig {
    pub fn new(chunk_size: usize, profile: ParallelismProfile) -> Self {
        Self { chunk_size, profile }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: STREAM_CHUNK_SIZE,
            profile: ParallelismProfile::for_chunk_size(STREAM_CHUNK_SIZE),
        }
    }
}

/// Counters gathered by the writer plus the deepest the reorder map got.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub counters: TelemetryCounters,
    pub max_reorder_depth: usize,
}

#[derive(Debug, Default)]
struct ReaderStats {
    dispatched: u64,
    read_time: Duration,
}

// ============================================================
// Generic pipeline
// ============================================================

/// Split `reader` into `config.chunk_size` chunks, run `op` on each across
/// the worker pool, and write results to `writer` in chunk order.
///
/// Empty input still dispatches one empty chunk so the output matches a
/// whole-buffer call on the same bytes. The first failing chunk aborts the
/// run; bytes already flushed stay in `writer`.
pub fn run_pipeline<R, W, F>(
    mut reader: R,
    writer: &mut W,
    config: &PipelineConfig,
    stage: Stage,
    timer: &mut TelemetryTimer,
    op: F,
) -> Result<PipelineOutcome, StreamError>
where
    R: Read + Send,
    W: Write,
    F: Fn(&Chunk) -> Result<Vec<u8>, CipherError> + Sync,
{
    if config.chunk_size == 0 {
        return Err(StreamError::pipeline("chunk size must be non-zero"));
    }
    let chunk_size = config.chunk_size;
    let workers = config.profile.cpu_workers.max(1);
    let inflight = config.profile.inflight_chunks.max(1);

    debug!(chunk_size, workers, inflight, %stage, "start pipeline");

    // ---- Channels ----
    let (credit_tx, credit_rx) = bounded::<()>(inflight);
    for _ in 0..inflight {
        credit_tx
            .try_send(())
            .map_err(|_| StreamError::pipeline("credit channel rejected initial credit"))?;
    }
    let (chunk_tx, chunk_rx) = bounded::<Chunk>(inflight);
    let (res_tx, res_rx) = bounded::<OrderedResult>(inflight);
    let op = &op;

    thread::scope(|scope| {
        // ---- Reader thread ----
        let reader_handle = scope.spawn(move || -> Result<ReaderStats, StreamError> {
            let mut stats = ReaderStats::default();
            loop {
                if credit_rx.recv().is_err() {
                    debug!("writer gone, reader stopping");
                    break;
                }
                let start = Instant::now();
                let buf = read_exact_or_eof(&mut reader, chunk_size)?;
                stats.read_time += start.elapsed();

                if buf.is_empty() && stats.dispatched > 0 {
                    break;
                }
                let eof = buf.len() < chunk_size;
                trace!(index = stats.dispatched, len = buf.len(), "dispatching chunk");
                let chunk = Chunk { index: stats.dispatched, payload: buf };
                if chunk_tx.send(chunk).is_err() {
                    debug!("workers gone, reader stopping");
                    break;
                }
                stats.dispatched += 1;
                if eof {
                    break;
                }
            }
            debug!(chunks = stats.dispatched, "reader finished");
            Ok(stats)
        });

        // ---- Workers ----
        let worker_handles: Vec<_> = (0..workers)
            .map(|i| {
                let rx = chunk_rx.clone();
                let tx = res_tx.clone();
                scope.spawn(move || ChunkWorker::new(i, op).run(rx, tx))
            })
            .collect();
        drop(chunk_rx);
        drop(res_tx);

        // ---- Ordered writer ----
        let mut ordered = OrderedChunkWriter::new(writer, inflight);
        let mut counters = TelemetryCounters::default();
        let drained = drain_results(&mut ordered, res_rx, credit_tx, &mut counters, stage, timer);
        if let Err(e) = &drained {
            warn!(error = %e, "aborting pipeline");
        }

        let reader_result = reader_handle
            .join()
            .map_err(|_| StreamError::pipeline("reader thread panicked"));
        let mut worker_panicked = false;
        for handle in worker_handles {
            worker_panicked |= handle.join().is_err();
        }

        drained?;
        let stats = reader_result??;
        if worker_panicked {
            return Err(StreamError::pipeline("chunk worker thread panicked"));
        }
        ordered.finish(stats.dispatched)?;
        timer.add_stage_time(Stage::Read, stats.read_time);

        debug!(chunks = stats.dispatched, max_reorder_depth = ordered.high_water_mark(), "pipeline finished");
        Ok(PipelineOutcome { counters, max_reorder_depth: ordered.high_water_mark() })
    })
}

/// Writer loop. Owns the result receiver and the credit sender so both are
/// dropped on return, which unblocks the reader and workers after an error.
fn drain_results<W: Write>(
    ordered: &mut OrderedChunkWriter<'_, W>,
    results: Receiver<OrderedResult>,
    credits: Sender<()>,
    counters: &mut TelemetryCounters,
    stage: Stage,
    timer: &mut TelemetryTimer,
) -> Result<(), StreamError> {
    for res in results.iter() {
        let OrderedResult { index, input_len, result, elapsed } = res;
        timer.add_stage_time(stage, elapsed);
        let data = result?;
        counters.add_chunk(input_len, data.len());

        let start = Instant::now();
        let flushed = ordered.push(index, data)?;
        timer.add_stage_time(Stage::Write, start.elapsed());

        for _ in 0..flushed {
            // Fails only once the reader has finished; nothing to refill then.
            let _ = credits.try_send(());
        }
    }
    Ok(())
}

// ============================================================
// Cipher pipelines
// ============================================================

/// Encrypt `reader` chunk by chunk. Each chunk is padded on its own.
pub fn run_encrypt_pipeline<R, W>(
    reader: R,
    writer: &mut W,
    ctx: &CipherContext,
    config: &PipelineConfig,
    timer: &mut TelemetryTimer,
) -> Result<PipelineOutcome, StreamError>
where
    R: Read + Send,
    W: Write,
{
    run_pipeline(reader, writer, config, Stage::Encrypt, timer, cipher_op(ctx, Direction::Encrypt))
}

/// Decrypt output of `run_encrypt_pipeline` made with the same chunk size:
/// every ciphertext chunk is exactly `ctx.ciphertext_len(chunk_size)` bytes
/// except the last.
pub fn run_decrypt_pipeline<R, W>(
    reader: R,
    writer: &mut W,
    ctx: &CipherContext,
    config: &PipelineConfig,
    timer: &mut TelemetryTimer,
) -> Result<PipelineOutcome, StreamError>
where
    R: Read + Send,
    W: Write,
{
    let cipher_config = PipelineConfig {
        chunk_size: ctx.ciphertext_len(config.chunk_size),
        profile: config.profile.clone(),
    };
    run_pipeline(reader, writer, &cipher_config, Stage::Decrypt, timer, cipher_op(ctx, Direction::Decrypt))
}
