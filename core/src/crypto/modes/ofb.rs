//! Output feedback. `O_i = E(O_{i-1})`, `O_0 = IV`, `C_i = P_i ^ O_i`.
//! The keystream ignores the data, so one routine serves both directions.

use super::ModeContext;
use crate::crypto::types::{CipherError, CipherMode};
use crate::utils::xor_in_place;

pub fn apply(ctx: &ModeContext<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bs = ctx.block_size;
    let mut keystream = ctx.iv_for(CipherMode::Ofb)?.to_vec();
    let mut next = vec![0u8; bs];
    let mut out = data.to_vec();

    for block in out.chunks_exact_mut(bs) {
        ctx.encrypt_into(&keystream, &mut next)?;
        std::mem::swap(&mut keystream, &mut next);
        xor_in_place(block, &keystream);
    }
    Ok(out)
}
