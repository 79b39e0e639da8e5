//! Counter mode.
//!
//! `counter_i = IV + i` as a big-endian integer over the whole block,
//! wrapping at the block width. Keystream blocks are independent, so both
//! directions fan out over `map_blocks`.

use super::parallel::map_blocks;
use super::ModeContext;
use crate::crypto::types::{CipherError, CipherMode};
use crate::utils::{add_to_counter_be, xor_in_place};

pub fn apply(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let iv = ctx.iv_for(CipherMode::Ctr)?;
    let mut out = vec![0u8; data.len()];

    map_blocks(data, &mut out, ctx.block_size, ctx.workers, |i, src, dst| {
        let mut counter = iv.to_vec();
        add_to_counter_be(&mut counter, i as u64);
        ctx.encrypt_into(&counter, dst)?;
        xor_in_place(dst, src);
        Ok(())
    })?;
    Ok(out)
}
