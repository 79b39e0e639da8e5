//! Stable public API: file and stream encryption with automatic choice
//! between one whole-buffer call and the chunked pipeline.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::constants::{MAX_IN_MEMORY_SIZE, STREAM_CHUNK_SIZE};
use crate::context::CipherContext;
use crate::crypto::types::CipherError;
use crate::stream::io::{open_input, open_output, take_shared_buffer, InputSource, OpenedInput, OutputSink};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::pipeline::{run_decrypt_pipeline, run_encrypt_pipeline, PipelineConfig};
use crate::telemetry::{Direction, ProcessingPath, Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Plaintext size above which the chunked pipeline is used.
    pub max_in_memory_size: u64,
    /// Plaintext bytes per chunk on the pipeline path.
    pub chunk_size: usize,
    /// `None` sizes the pool from the host (`ParallelismProfile::dynamic`).
    pub profile: Option<ParallelismProfile>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_in_memory_size: MAX_IN_MEMORY_SIZE,
            chunk_size: STREAM_CHUNK_SIZE,
            profile: None,
        }
    }
}

impl StreamConfig {
    /// Snap the threshold and chunk size to whole cipher blocks, and keep a
    /// chunk no larger than the threshold. With both aligned, any input the
    /// pipeline splits into two or more chunks produces strictly more
    /// ciphertext than a threshold-sized plaintext, so decryption can pick
    /// its route from the ciphertext length alone.
    fn resolve(&self, ctx: &CipherContext) -> Result<Resolved, StreamError> {
        if self.chunk_size == 0 {
            return Err(CipherError::Configuration("stream chunk size must be non-zero".into()).into());
        }
        let bs = ctx.block_size();
        let threshold = self.max_in_memory_size - self.max_in_memory_size % bs as u64;

        let mut chunk_size = self.chunk_size.max(bs);
        chunk_size -= chunk_size % bs;
        if threshold >= bs as u64 && chunk_size as u64 > threshold {
            chunk_size = threshold as usize;
        }

        let profile = self
            .profile
            .clone()
            .unwrap_or_else(|| ParallelismProfile::for_chunk_size(chunk_size));
        Ok(Resolved { threshold, pipeline: PipelineConfig::new(chunk_size, profile) })
    }
}

struct Resolved {
    /// Plaintext bytes handled in one call.
    threshold: u64,
    pipeline: PipelineConfig,
}

impl Resolved {
    /// Input-size threshold for `direction`. Decryption compares against the
    /// ciphertext size of a threshold-sized plaintext, so whatever was
    /// encrypted in memory is also decrypted in memory.
    fn input_threshold(&self, ctx: &CipherContext, direction: Direction) -> Result<u64, StreamError> {
        match direction {
            Direction::Encrypt => Ok(self.threshold),
            Direction::Decrypt => {
                let plain = usize::try_from(self.threshold).map_err(|_| {
                    CipherError::Configuration(format!(
                        "in-memory threshold {} exceeds the address space",
                        self.threshold
                    ))
                })?;
                Ok(ctx.ciphertext_len(plain) as u64)
            }
        }
    }
}

/// 🔐 Encrypt a stream
pub fn encrypt_stream(
    ctx: &CipherContext,
    input: InputSource,
    output: OutputSink,
    config: &StreamConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    run(ctx, input, output, config, Direction::Encrypt)
}

/// 🔓 Decrypt a stream
pub fn decrypt_stream(
    ctx: &CipherContext,
    input: InputSource,
    output: OutputSink,
    config: &StreamConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    run(ctx, input, output, config, Direction::Decrypt)
}

/// Encrypt the file at `input` into `output` with default settings.
pub fn encrypt_file(
    ctx: &CipherContext,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<TelemetrySnapshot, StreamError> {
    encrypt_file_with(ctx, input, output, &StreamConfig::default())
}

/// Decrypt the file at `input` into `output` with default settings.
pub fn decrypt_file(
    ctx: &CipherContext,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<TelemetrySnapshot, StreamError> {
    decrypt_file_with(ctx, input, output, &StreamConfig::default())
}

pub fn encrypt_file_with(
    ctx: &CipherContext,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    let (src, dst) = file_endpoints(input.as_ref(), output.as_ref());
    run(ctx, src, dst, config, Direction::Encrypt)
}

pub fn decrypt_file_with(
    ctx: &CipherContext,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &StreamConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    let (src, dst) = file_endpoints(input.as_ref(), output.as_ref());
    run(ctx, src, dst, config, Direction::Decrypt)
}

fn file_endpoints(input: &Path, output: &Path) -> (InputSource, OutputSink) {
    (InputSource::File(input.to_path_buf()), OutputSink::File(output.to_path_buf()))
}

/// Where a run goes once the input size is known or probed.
enum Route {
    InMemory(Vec<u8>),
    Streamed(Box<dyn Read + Send>),
}

/// Pick a route. Sized inputs compare their length; unsized readers are
/// probed for `threshold + 1` bytes and the probe is replayed ahead of the
/// rest of the stream.
fn choose_route(input: OpenedInput, threshold: u64, timer: &mut TelemetryTimer) -> Result<Route, StreamError> {
    let OpenedInput { mut reader, len } = input;

    if let Some(len) = len {
        if len > threshold {
            return Ok(Route::Streamed(reader));
        }
        let mut buf = Vec::with_capacity(len as usize);
        timer.time(Stage::Read, || reader.read_to_end(&mut buf))?;
        return Ok(Route::InMemory(buf));
    }

    let mut head = Vec::new();
    timer.time(Stage::Read, || reader.by_ref().take(threshold.saturating_add(1)).read_to_end(&mut head))?;
    if head.len() as u64 <= threshold {
        Ok(Route::InMemory(head))
    } else {
        Ok(Route::Streamed(Box::new(Cursor::new(head).chain(reader))))
    }
}

fn run(
    ctx: &CipherContext,
    input: InputSource,
    output: OutputSink,
    config: &StreamConfig,
    direction: Direction,
) -> Result<TelemetrySnapshot, StreamError> {
    let mut timer = TelemetryTimer::new();
    let resolved = config.resolve(ctx)?;
    let threshold = resolved.input_threshold(ctx, direction)?;

    let opened = open_input(input)?;
    let (mut writer, maybe_buf) = open_output(output)?;

    let route = choose_route(opened, threshold, &mut timer)?;
    let (counters, path) = match route {
        Route::InMemory(data) => {
            debug!(?direction, len = data.len(), threshold, "in-memory path");
            (run_in_memory(ctx, &data, &mut writer, direction, &mut timer)?, ProcessingPath::InMemory)
        }
        Route::Streamed(reader) => {
            debug!(?direction, threshold, "streamed path");
            let pipe = &resolved.pipeline;
            let outcome = match direction {
                Direction::Encrypt => run_encrypt_pipeline(reader, &mut writer, ctx, pipe, &mut timer)?,
                Direction::Decrypt => run_decrypt_pipeline(reader, &mut writer, ctx, pipe, &mut timer)?,
            };
            (outcome.counters, ProcessingPath::Streamed)
        }
    };

    writer.flush()?;
    drop(writer);
    timer.finish();

    let mut snapshot = TelemetrySnapshot::from(&counters, &timer, direction, path);
    if let Some(ref buf) = maybe_buf {
        snapshot.attach_output(take_shared_buffer(buf)?);
    }

    info!(
        ?direction,
        ?path,
        chunks = snapshot.chunks,
        bytes_in = snapshot.bytes_in,
        bytes_out = snapshot.bytes_out,
        elapsed_ms = snapshot.elapsed.as_millis() as u64,
        "stream finished"
    );
    Ok(snapshot)
}

fn run_in_memory<W: Write + ?Sized>(
    ctx: &CipherContext,
    data: &[u8],
    writer: &mut W,
    direction: Direction,
    timer: &mut TelemetryTimer,
) -> Result<TelemetryCounters, StreamError> {
    let out = match direction {
        Direction::Encrypt => timer.time(Stage::Encrypt, || ctx.encrypt(data))?,
        Direction::Decrypt => timer.time(Stage::Decrypt, || ctx.decrypt(data))?,
    };
    timer.time(Stage::Write, || writer.write_all(&out))?;

    let mut counters = TelemetryCounters::default();
    counters.add_chunk(data.len(), out.len());
    Ok(counters)
}
