//! Byte helpers shared by the padding and mode layers.

use std::fmt;
use num_enum::TryFromPrimitive;

/// XOR `src` into `dst` in place. Both slices must have the same length.
#[inline]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// XOR two equal-length slices into a fresh buffer.
#[inline]
pub fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// Add `value` to `counter`, read as a big-endian unsigned integer spanning
/// the whole slice. Carries propagate leftwards; overflow wraps at the slice
/// width.
pub fn add_to_counter_be(counter: &mut [u8], value: u64) {
    let mut carry = value as u128;
    for byte in counter.iter_mut().rev() {
        if carry == 0 {
            break;
        }
        let sum = *byte as u128 + (carry & 0xFF);
        *byte = sum as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
}

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}
