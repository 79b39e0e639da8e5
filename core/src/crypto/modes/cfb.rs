//! Cipher feedback with full-block segments.
//!
//! `C_i = P_i ^ E(C_{i-1})`, `C_0 = IV`. Only the forward cipher is used.

use super::ModeContext;
use crate::crypto::types::{CipherError, CipherMode};
use crate::utils::xor_in_place;

pub fn encrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut feedback = ctx.iv_for(CipherMode::Cfb)?.to_vec();
    let mut out = vec![0u8; data.len()];

    for (src, dst) in data.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        ctx.encrypt_into(&feedback, dst)?;
        xor_in_place(dst, src);
        feedback.copy_from_slice(dst);
    }
    Ok(out)
}

pub fn decrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut feedback = ctx.iv_for(CipherMode::Cfb)?;
    let mut out = vec![0u8; data.len()];

    for (src, dst) in data.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        ctx.encrypt_into(feedback, dst)?;
        xor_in_place(dst, src);
        feedback = src;
    }
    Ok(out)
}
