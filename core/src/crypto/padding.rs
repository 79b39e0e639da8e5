//! Reversible byte padding to a block boundary.
//!
//! Every scheme except `Zeros` always adds between 1 and `block_size` bytes,
//! so block-aligned input gains a full extra block and the final byte always
//! carries the pad count. `Zeros` adds nothing to aligned input and strips
//! every trailing zero on removal, which is lossy for payloads that end in
//! 0x00.

use crate::crypto::random::RandomSource;
use crate::crypto::types::{CipherError, PaddingMode};

/// Number of bytes `mode` appends to `len` bytes of data.
pub fn pad_count(len: usize, block_size: usize, mode: PaddingMode) -> usize {
    let rem = len % block_size;
    match mode {
        PaddingMode::Zeros => (block_size - rem) % block_size,
        PaddingMode::Pkcs7 | PaddingMode::AnsiX923 | PaddingMode::Iso10126 => block_size - rem,
    }
}

/// Length of `len` bytes after padding.
pub fn padded_len(len: usize, block_size: usize, mode: PaddingMode) -> usize {
    len + pad_count(len, block_size, mode)
}

/// Append padding per `mode`. `rng` is consulted only by ISO 10126.
pub fn apply(
    data: &[u8],
    block_size: usize,
    mode: PaddingMode,
    rng: &dyn RandomSource,
) -> Result<Vec<u8>, CipherError> {
    let pad = pad_count(data.len(), block_size, mode);
    if pad > u8::MAX as usize {
        return Err(CipherError::Configuration(format!(
            "block size {} too large for {} padding", block_size, mode
        )));
    }

    let mut out = Vec::with_capacity(data.len() + pad);
    out.extend_from_slice(data);

    match mode {
        PaddingMode::Zeros => out.resize(data.len() + pad, 0x00),
        PaddingMode::Pkcs7 => out.resize(data.len() + pad, pad as u8),
        PaddingMode::AnsiX923 => {
            out.resize(data.len() + pad - 1, 0x00);
            out.push(pad as u8);
        }
        PaddingMode::Iso10126 => {
            let mut filler = vec![0u8; pad - 1];
            rng.fill(&mut filler)?;
            out.extend_from_slice(&filler);
            out.push(pad as u8);
        }
    }
    Ok(out)
}

/// Strip padding per `mode`, validating the trailing pad-length byte.
///
/// The filler bytes of PKCS7 and ANSI X9.23 are not checked, only the count.
pub fn remove(data: &[u8], block_size: usize, mode: PaddingMode) -> Result<Vec<u8>, CipherError> {
    if data.len() % block_size != 0 {
        return Err(CipherError::Padding(format!(
            "padded length {} is not a multiple of block size {}",
            data.len(), block_size
        )));
    }

    match mode {
        PaddingMode::Zeros => {
            let end = data.iter().rposition(|&b| b != 0x00).map_or(0, |i| i + 1);
            Ok(data[..end].to_vec())
        }
        PaddingMode::Pkcs7 | PaddingMode::AnsiX923 | PaddingMode::Iso10126 => {
            let Some(&last) = data.last() else {
                return Err(CipherError::Padding(format!("{} padding missing: empty input", mode)));
            };
            let pad = last as usize;
            if pad == 0 || pad > block_size {
                return Err(CipherError::Padding(format!(
                    "invalid pad length {} for block size {}",
                    pad, block_size
                )));
            }
            Ok(data[..data.len() - pad].to_vec())
        }
    }
}
