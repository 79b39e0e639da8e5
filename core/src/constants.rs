/// Inputs up to this size are processed with one whole-buffer call (10 MiB).
pub const MAX_IN_MEMORY_SIZE: u64 = 10 * 1024 * 1024;

/// Plaintext chunk size used by the streamed path (1 MiB).
/// Snapped down to whole cipher blocks when a run starts.
pub const STREAM_CHUNK_SIZE: usize = 1024 * 1024;

/// Below this many blocks the parallel modes run on the calling thread.
pub const PARALLEL_MIN_BLOCKS: usize = 256;

/// Hard cap on chunks read but not yet written by the reassembly writer.
pub const INFLIGHT_HARD_CAP: usize = 64;

/// Fraction of available memory the pipeline may hold in flight.
pub const INFLIGHT_MEM_FRACTION: f64 = 0.25;

/// Stable numeric tags for modes (mirrored by `CipherMode`).
pub mod mode_ids {
    pub const ECB: u8          = 0;
    pub const CBC: u8          = 1;
    pub const PCBC: u8         = 2;
    pub const CFB: u8          = 3;
    pub const OFB: u8          = 4;
    pub const CTR: u8          = 5;
    pub const RANDOM_DELTA: u8 = 6;
}

/// Stable numeric tags for padding schemes (mirrored by `PaddingMode`).
pub mod padding_ids {
    pub const ZEROS: u8      = 0;
    pub const ANSI_X923: u8  = 1;
    pub const PKCS7: u8      = 2;
    pub const ISO_10126: u8  = 3;
}
