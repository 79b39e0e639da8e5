//! blockmode-core
//!
//! Block-cipher mode-of-operation engine with a concurrent streaming
//! pipeline. Any fixed-block-size primitive implementing `BlockCipher` can
//! be driven through seven modes and four padding schemes, in memory or
//! chunk by chunk over arbitrarily large inputs.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod crypto;
pub mod context;
pub mod telemetry;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::context::{CipherContext, CipherContextBuilder, CipherTask, ModeOptions};
    pub use crate::crypto::{
        BlockCipher, BlockCipherError, CipherError, CipherMode, OsRandom, PaddingMode, RandomSource, SeededRandom,
        Xtea, XteaWide,
    };
    pub use crate::stream::{
        decrypt_file, decrypt_stream, encrypt_file, encrypt_stream, InputSource, OutputSink, ParallelismProfile,
        StreamConfig,
    };
    pub use crate::telemetry::{ProcessingPath, TelemetrySnapshot};
    pub use crate::types::StreamError;
}
