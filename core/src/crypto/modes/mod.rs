//! Mode-of-operation engine.
//!
//! Every routine takes block-aligned input (padding is the caller's job)
//! and a `ModeContext` borrowing the cipher, IV and randomness source.
//! ECB and CTR fan out over `parallel::map_blocks`; CBC and RandomDelta
//! decrypt run the raw block decrypts in parallel and then a sequential
//! combine. PCBC, CFB and OFB are sequential.

mod cbc;
mod cfb;
mod ctr;
mod ecb;
mod ofb;
pub mod parallel;
mod pcbc;
mod random_delta;

use crate::crypto::random::RandomSource;
use crate::crypto::types::{BlockCipher, BlockCipherError, CipherError, CipherMode};

/// Borrowed view of everything a mode routine needs.
pub struct ModeContext<'a> {
    pub cipher: &'a dyn BlockCipher,
    pub block_size: usize,
    pub iv: Option<&'a [u8]>,
    pub rng: &'a dyn RandomSource,
    /// Upper bound on threads for parallel phases. 1 disables fan-out.
    pub workers: usize,
}

impl<'a> ModeContext<'a> {
    /// IV for `mode`, validated against the block size.
    pub fn iv_for(&self, mode: CipherMode) -> Result<&'a [u8], CipherError> {
        match self.iv {
            Some(iv) if iv.len() == self.block_size => Ok(iv),
            other => Err(CipherError::Iv {
                mode,
                expected: self.block_size,
                actual: other.map(<[u8]>::len),
            }),
        }
    }

    /// Encrypt one block into `out`, checking the cipher kept its block size.
    pub(crate) fn encrypt_into(&self, block: &[u8], out: &mut [u8]) -> Result<(), CipherError> {
        let enc = self.cipher.encrypt_block(block)?;
        copy_block(&enc, out)
    }

    pub(crate) fn decrypt_into(&self, block: &[u8], out: &mut [u8]) -> Result<(), CipherError> {
        let dec = self.cipher.decrypt_block(block)?;
        copy_block(&dec, out)
    }
}

fn copy_block(src: &[u8], out: &mut [u8]) -> Result<(), CipherError> {
    if src.len() != out.len() {
        return Err(BlockCipherError::InvalidBlockLen { expected: out.len(), actual: src.len() }.into());
    }
    out.copy_from_slice(src);
    Ok(())
}

fn check_aligned(data: &[u8], block_size: usize) -> Result<(), CipherError> {
    if data.len() % block_size != 0 {
        return Err(CipherError::Input(format!(
            "length {} is not a multiple of block size {}",
            data.len(),
            block_size
        )));
    }
    Ok(())
}

/// Run `mode` forward over block-aligned `data`.
pub fn encrypt(mode: CipherMode, ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_aligned(data, ctx.block_size)?;
    if mode.requires_iv() {
        ctx.iv_for(mode)?;
    }
    match mode {
        CipherMode::Ecb => ecb::encrypt(ctx, data),
        CipherMode::Cbc => cbc::encrypt(ctx, data),
        CipherMode::Pcbc => pcbc::encrypt(ctx, data),
        CipherMode::Cfb => cfb::encrypt(ctx, data),
        CipherMode::Ofb => ofb::apply(ctx, data),
        CipherMode::Ctr => ctr::apply(ctx, data),
        CipherMode::RandomDelta => random_delta::encrypt(ctx, data),
    }
}

/// Invert `mode` over block-aligned `data`. The result is still padded.
pub fn decrypt(mode: CipherMode, ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_aligned(data, ctx.block_size)?;
    if mode.requires_iv() {
        ctx.iv_for(mode)?;
    }
    match mode {
        CipherMode::Ecb => ecb::decrypt(ctx, data),
        CipherMode::Cbc => cbc::decrypt(ctx, data),
        CipherMode::Pcbc => pcbc::decrypt(ctx, data),
        CipherMode::Cfb => cfb::decrypt(ctx, data),
        CipherMode::Ofb => ofb::apply(ctx, data),
        CipherMode::Ctr => ctr::apply(ctx, data),
        CipherMode::RandomDelta => random_delta::decrypt(ctx, data),
    }
}
