//! Propagating cipher block chaining.
//!
//! `C_i = E(P_i ^ P_{i-1} ^ C_{i-1})` with `P_0 = 0` and `C_0 = IV`.
//! Each block depends on both neighbours' plaintext and ciphertext, so
//! neither direction parallelizes.

use super::ModeContext;
use crate::crypto::types::{CipherError, CipherMode};
use crate::utils::xor_in_place;

pub fn encrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    // chain = P_{i-1} ^ C_{i-1}
    let mut chain = ctx.iv_for(CipherMode::Pcbc)?.to_vec();
    let mut out = vec![0u8; data.len()];

    for (src, dst) in data.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        let mut x = src.to_vec();
        xor_in_place(&mut x, &chain);
        ctx.encrypt_into(&x, dst)?;

        chain.copy_from_slice(src);
        xor_in_place(&mut chain, dst);
    }
    Ok(out)
}

pub fn decrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut chain = ctx.iv_for(CipherMode::Pcbc)?.to_vec();
    let mut out = vec![0u8; data.len()];

    for (src, dst) in data.chunks_exact(bs).zip(out.chunks_exact_mut(bs)) {
        ctx.decrypt_into(src, dst)?;
        xor_in_place(dst, &chain);

        chain.copy_from_slice(dst);
        xor_in_place(&mut chain, src);
    }
    Ok(out)
}
