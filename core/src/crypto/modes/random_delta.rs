//! RandomDelta: a random seed block chains the ciphertext.
//!
//! Encrypt draws `delta` from the context's randomness source and emits it
//! as block 0, then `C_i = E(P_i ^ delta)` and `delta ^= C_i`. The running
//! delta on decrypt depends only on ciphertext, so the raw `D(C_i)` fan out
//! and a prefix-XOR pass recovers the plaintext.

use super::parallel::map_blocks;
use super::ModeContext;
use crate::crypto::types::CipherError;
use crate::utils::xor_in_place;

pub fn encrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut out = vec![0u8; bs + data.len()];
    let (seed, body) = out.split_at_mut(bs);
    ctx.rng.fill(seed)?;

    let mut delta = seed.to_vec();
    let mut x = vec![0u8; bs];
    for (src, dst) in data.chunks_exact(bs).zip(body.chunks_exact_mut(bs)) {
        x.copy_from_slice(src);
        xor_in_place(&mut x, &delta);
        ctx.encrypt_into(&x, dst)?;
        xor_in_place(&mut delta, dst);
    }
    Ok(out)
}

pub fn decrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    if data.len() < bs {
        return Err(CipherError::Input(format!(
            "RandomDelta ciphertext of {} bytes is missing its {}-byte seed block",
            data.len(),
            bs
        )));
    }
    let (seed, body) = data.split_at(bs);

    let mut out = vec![0u8; body.len()];
    map_blocks(body, &mut out, bs, ctx.workers, |_, src, dst| ctx.decrypt_into(src, dst))?;

    let mut delta = seed.to_vec();
    for (dst, src) in out.chunks_exact_mut(bs).zip(body.chunks_exact(bs)) {
        xor_in_place(dst, &delta);
        xor_in_place(&mut delta, src);
    }
    Ok(out)
}
