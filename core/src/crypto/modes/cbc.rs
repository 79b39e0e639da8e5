//! Cipher block chaining.
//!
//! Encrypt: `C_i = E(P_i ^ C_{i-1})`, `C_0 = IV`, inherently sequential.
//! Decrypt: `P_i = D(C_i) ^ C_{i-1}`. Every `D(C_i)` is independent, so the
//! raw decrypts fan out first and the XOR with the previous ciphertext block
//! runs afterwards in order.

use std::iter;

use super::parallel::map_blocks;
use super::ModeContext;
use crate::crypto::types::{CipherError, CipherMode};
use crate::utils::{xor_bytes, xor_in_place};

pub fn encrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut prev = ctx.iv_for(CipherMode::Cbc)?.to_vec();
    let mut out = vec![0u8; data.len()];

    for (src, dst) in data.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        let x = xor_bytes(src, &prev);
        ctx.encrypt_into(&x, dst)?;
        prev.copy_from_slice(dst);
    }
    Ok(out)
}

pub fn decrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let iv = ctx.iv_for(CipherMode::Cbc)?;

    let mut out = vec![0u8; data.len()];
    map_blocks(data, &mut out, bs, ctx.workers, |_, src, dst| ctx.decrypt_into(src, dst))?;

    let previous = iter::once(iv).chain(data.chunks_exact(bs));
    for (block, prev) in out.chunks_exact_mut(bs).zip(previous) {
        xor_in_place(block, prev);
    }
    Ok(out)
}
