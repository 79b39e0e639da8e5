//! Electronic codebook: every block independent, fully parallel both ways.

use super::parallel::map_blocks;
use super::ModeContext;
use crate::crypto::types::CipherError;

pub fn encrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut out = vec![0u8; data.len()];
    map_blocks(data, &mut out, ctx.block_size, ctx.workers, |_, src, dst| ctx.encrypt_into(src, dst))?;
    Ok(out)
}

pub fn decrypt(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut out = vec![0u8; data.len()];
    map_blocks(data, &mut out, ctx.block_size, ctx.workers, |_, src, dst| ctx.decrypt_into(src, dst))?;
    Ok(out)
}
