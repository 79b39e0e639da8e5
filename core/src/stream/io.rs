//! Normalized I/O for the stream API and the index-ordered chunk writer.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::trace;

use crate::types::StreamError;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction. `Memory` output is returned in
/// `TelemetrySnapshot::output`.
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    Memory,
}

/// Reader plus its length when the source knows it up front.
pub struct OpenedInput {
    pub reader: Box<dyn Read + Send>,
    pub len: Option<u64>,
}

pub fn open_input(src: InputSource) -> Result<OpenedInput, StreamError> {
    let opened = match src {
        InputSource::Reader(reader) => OpenedInput { reader, len: None },
        InputSource::File(path) => {
            let file = File::open(path)?;
            let len = file.metadata()?.len();
            OpenedInput { reader: Box::new(file), len: Some(len) }
        }
        InputSource::Memory(buf) => {
            let len = buf.len() as u64;
            OpenedInput { reader: Box::new(Cursor::new(buf)), len: Some(len) }
        }
    };
    Ok(opened)
}

/// Normalize an output sink into a boxed writer. For `Memory` the second
/// element is the shared buffer the writer appends to.
pub fn open_output(
    sink: OutputSink,
) -> Result<(Box<dyn Write + Send>, Option<Arc<Mutex<Vec<u8>>>>), StreamError> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => Ok((Box::new(BufWriter::new(File::create(p)?)), None)),
        OutputSink::Memory => {
            let buf = Arc::new(Mutex::new(Vec::new()));
            let writer = SharedBufferWriter { buf: buf.clone() };
            Ok((Box::new(writer), Some(buf)))
        }
    }
}

/// Take the bytes collected behind an `OutputSink::Memory` writer.
pub fn take_shared_buffer(buf: &Arc<Mutex<Vec<u8>>>) -> Result<Vec<u8>, StreamError> {
    let mut guard = buf
        .lock()
        .map_err(|_| StreamError::pipeline("output buffer lock poisoned"))?;
    Ok(std::mem::take(&mut *guard))
}

pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output buffer lock poisoned"))?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fill up to `len` bytes, stopping early only at EOF. A short result means
/// the stream is exhausted.
pub fn read_exact_or_eof<R: Read>(r: &mut R, len: usize) -> Result<Bytes, StreamError> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

// ================= Ordered writer =================

/// Reassembles out-of-order chunk results and writes them strictly by index.
///
/// At most `capacity` chunks may wait in the reorder map; the pipeline's
/// credit scheme keeps it there, and a push beyond it is reported as a
/// pipeline fault rather than buffered.
pub struct OrderedChunkWriter<'a, W: Write> {
    out: &'a mut W,
    next: u64,
    pending: BTreeMap<u64, Vec<u8>>,
    capacity: usize,
    high_water: usize,
    bytes_written: u64,
}

impl<'a, W: Write> OrderedChunkWriter<'a, W> {
    pub fn new(out: &'a mut W, capacity: usize) -> Self {
        Self {
            out,
            next: 0,
            pending: BTreeMap::new(),
            capacity: capacity.max(1),
            high_water: 0,
            bytes_written: 0,
        }
    }

    /// Queue chunk `index` and flush every contiguous chunk now available.
    /// Returns how many chunks were written.
    pub fn push(&mut self, index: u64, data: Vec<u8>) -> Result<usize, StreamError> {
        if index < self.next || self.pending.contains_key(&index) {
            return Err(StreamError::pipeline(format!("duplicate chunk {index}")));
        }
        if self.pending.len() >= self.capacity {
            return Err(StreamError::pipeline(format!(
                "reorder buffer full ({} chunks) while waiting for chunk {}",
                self.capacity, self.next
            )));
        }
        self.pending.insert(index, data);
        self.high_water = self.high_water.max(self.pending.len());
        self.flush_ready()
    }

    /// Confirm that exactly `expected` chunks were written with no gaps.
    pub fn finish(&mut self, expected: u64) -> Result<(), StreamError> {
        if let Some(&first_stranded) = self.pending.keys().next() {
            return Err(StreamError::pipeline(format!(
                "chunk {} never arrived; {} later chunks stranded from {}",
                self.next,
                self.pending.len(),
                first_stranded
            )));
        }
        if self.next != expected {
            return Err(StreamError::pipeline(format!(
                "wrote {} chunks, reader dispatched {}",
                self.next, expected
            )));
        }
        self.out.flush()?;
        Ok(())
    }

    /// Next index the writer is waiting for.
    pub fn next_index(&self) -> u64 {
        self.next
    }

    /// Largest number of chunks that waited in the reorder map at once.
    pub fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn flush_ready(&mut self) -> Result<usize, StreamError> {
        let mut flushed = 0;
        while let Some(data) = self.pending.remove(&self.next) {
            self.out.write_all(&data)?;
            trace!(index = self.next, len = data.len(), "flushed chunk");
            self.bytes_written += data.len() as u64;
            self.next += 1;
            flushed += 1;
        }
        Ok(flushed)
    }
}
