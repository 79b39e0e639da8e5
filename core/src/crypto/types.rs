use std::fmt;
use std::str::FromStr;

use num_enum::{TryFromPrimitive, TryFromPrimitiveError};
use thiserror::Error;

use crate::constants::{mode_ids, padding_ids};
use crate::utils::enum_name_or_hex;

/// Fixed-block-size symmetric primitive consumed by the mode engine.
///
/// The engine never learns which algorithm it drives. Implementations must
/// be shareable across worker threads; key changes take `&mut self`, so
/// they cannot race with block operations on the same instance.
pub trait BlockCipher: Send + Sync {
    /// Install key material for the encryption direction.
    fn set_encryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError>;

    /// Install key material for the decryption direction.
    fn set_decryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError>;

    /// Encrypt exactly one block of `block_size()` bytes.
    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError>;

    /// Decrypt exactly one block of `block_size()` bytes.
    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError>;

    /// Block size in bytes. Must be non-zero and constant for the instance.
    fn block_size(&self) -> usize;
}

/// Failure reported by a `BlockCipher` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockCipherError {
    #[error("invalid key length: {actual} bytes ({expected})")]
    InvalidKeyLen { expected: &'static str, actual: usize },

    #[error("invalid block length: expected={expected}, actual={actual}")]
    InvalidBlockLen { expected: usize, actual: usize },

    #[error("key not set")]
    KeyNotSet,

    #[error("{0}")]
    Failure(String),
}

/// Errors produced by the padding layer, the mode engine and `CipherContext`.
#[derive(Debug, Error)]
pub enum CipherError {
    /// No cipher bound, zero block size, or an unknown mode/padding tag.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Ciphertext has an impossible length for the active mode.
    #[error("input error: {0}")]
    Input(String),

    /// Missing or wrong-length IV for a mode that needs one.
    #[error("IV error: {mode} requires a {expected}-byte IV, got {}", describe_iv(.actual))]
    Iv {
        mode: CipherMode,
        expected: usize,
        actual: Option<usize>,
    },

    /// Malformed pad-length byte (zero or above the block size).
    #[error("padding error: {0}")]
    Padding(String),

    #[error("block cipher error: {0}")]
    BlockCipher(#[from] BlockCipherError),

    #[error("randomness source error: {0}")]
    Randomness(String),

    /// The background producer of an async operation died before sending.
    #[error("async task aborted before producing a result")]
    TaskAborted,
}

fn describe_iv(actual: &Option<usize>) -> String {
    match actual {
        Some(n) => format!("{} bytes", n),
        None => "none".to_string(),
    }
}

/// Block cipher mode of operation.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CipherMode {
    Ecb         = mode_ids::ECB,
    Cbc         = mode_ids::CBC,
    Pcbc        = mode_ids::PCBC,
    Cfb         = mode_ids::CFB,
    Ofb         = mode_ids::OFB,
    Ctr         = mode_ids::CTR,
    RandomDelta = mode_ids::RANDOM_DELTA,
}

impl CipherMode {
    pub const ALL: [CipherMode; 7] = [
        CipherMode::Ecb,
        CipherMode::Cbc,
        CipherMode::Pcbc,
        CipherMode::Cfb,
        CipherMode::Ofb,
        CipherMode::Ctr,
        CipherMode::RandomDelta,
    ];

    /// Whether the context must carry an IV of exactly one block.
    /// ECB is the only mode that tolerates a missing IV. RandomDelta keeps
    /// the requirement even though its chaining seed travels in the
    /// ciphertext.
    pub fn requires_iv(self) -> bool {
        self != CipherMode::Ecb
    }

    /// Extra ciphertext bytes the mode emits ahead of the content blocks.
    pub fn prefix_len(self, block_size: usize) -> usize {
        match self {
            CipherMode::RandomDelta => block_size,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CipherMode::Ecb         => "ECB",
            CipherMode::Cbc         => "CBC",
            CipherMode::Pcbc        => "PCBC",
            CipherMode::Cfb         => "CFB",
            CipherMode::Ofb         => "OFB",
            CipherMode::Ctr         => "CTR",
            CipherMode::RandomDelta => "RandomDelta",
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherMode {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CipherMode::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CipherError::Configuration(format!("unknown cipher mode: {s}")))
    }
}

impl From<TryFromPrimitiveError<CipherMode>> for CipherError {
    fn from(e: TryFromPrimitiveError<CipherMode>) -> Self {
        CipherError::Configuration(format!(
            "unsupported cipher mode tag: {}",
            enum_name_or_hex::<CipherMode>(e.number)
        ))
    }
}

/// Byte padding scheme applied before encryption.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum PaddingMode {
    Zeros    = padding_ids::ZEROS,
    AnsiX923 = padding_ids::ANSI_X923,
    Pkcs7    = padding_ids::PKCS7,
    Iso10126 = padding_ids::ISO_10126,
}

impl PaddingMode {
    pub const ALL: [PaddingMode; 4] = [
        PaddingMode::Zeros,
        PaddingMode::AnsiX923,
        PaddingMode::Pkcs7,
        PaddingMode::Iso10126,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaddingMode::Zeros    => "Zeros",
            PaddingMode::AnsiX923 => "ANSIX923",
            PaddingMode::Pkcs7    => "PKCS7",
            PaddingMode::Iso10126 => "ISO10126",
        }
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddingMode {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaddingMode::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CipherError::Configuration(format!("unknown padding mode: {s}")))
    }
}

impl From<TryFromPrimitiveError<PaddingMode>> for CipherError {
    fn from(e: TryFromPrimitiveError<PaddingMode>) -> Self {
        CipherError::Configuration(format!(
            "unsupported padding tag: {}",
            enum_name_or_hex::<PaddingMode>(e.number)
        ))
    }
}
