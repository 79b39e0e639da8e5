//! Reference `BlockCipher` implementations.
//!
//! XTEA (public domain, 64-bit block, 128-bit key) and a 128-bit-block
//! widening built from a three-round Feistel network over XTEA. They exist
//! so the engine can be exercised end to end without an external algorithm
//! crate. Not constant-time; do not use them to protect real data.

use crate::crypto::types::{BlockCipher, BlockCipherError};

const NUM_ROUNDS: u32 = 32;
const DELTA: u32 = 0x9E37_79B9;
const KEY_LEN: usize = 16;

type Key = [u32; 4];

fn encipher(key: &Key, v: [u32; 2]) -> [u32; 2] {
    let [mut v0, mut v1] = v;
    let mut sum: u32 = 0;
    for _ in 0..NUM_ROUNDS {
        v0 = v0.wrapping_add(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)) ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
    }
    [v0, v1]
}

fn decipher(key: &Key, v: [u32; 2]) -> [u32; 2] {
    let [mut v0, mut v1] = v;
    let mut sum = DELTA.wrapping_mul(NUM_ROUNDS);
    for _ in 0..NUM_ROUNDS {
        v1 = v1.wrapping_sub(
            (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)) ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)) ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
    }
    [v0, v1]
}

fn parse_key(key: &[u8]) -> Result<Key, BlockCipherError> {
    if key.len() != KEY_LEN {
        return Err(BlockCipherError::InvalidKeyLen { expected: "16", actual: key.len() });
    }
    let mut out = [0u32; 4];
    for (word, bytes) in out.iter_mut().zip(key.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    Ok(out)
}

fn check_block(block: &[u8], expected: usize) -> Result<(), BlockCipherError> {
    if block.len() != expected {
        return Err(BlockCipherError::InvalidBlockLen { expected, actual: block.len() });
    }
    Ok(())
}

fn to_words(half: &[u8]) -> [u32; 2] {
    [
        u32::from_be_bytes([half[0], half[1], half[2], half[3]]),
        u32::from_be_bytes([half[4], half[5], half[6], half[7]]),
    ]
}

fn from_words(v: [u32; 2]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&v[0].to_be_bytes());
    out[4..].copy_from_slice(&v[1].to_be_bytes());
    out
}

/// XTEA with 64-bit blocks. The same key serves both directions.
#[derive(Debug, Clone, Default)]
pub struct Xtea {
    key: Option<Key>,
}

impl Xtea {
    pub const BLOCK_SIZE: usize = 8;

    pub fn new(key: &[u8]) -> Result<Self, BlockCipherError> {
        Ok(Self { key: Some(parse_key(key)?) })
    }

    fn key(&self) -> Result<&Key, BlockCipherError> {
        self.key.as_ref().ok_or(BlockCipherError::KeyNotSet)
    }
}

impl BlockCipher for Xtea {
    fn set_encryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError> {
        self.key = Some(parse_key(key)?);
        Ok(())
    }

    fn set_decryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError> {
        self.set_encryption_key(key)
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        check_block(block, Self::BLOCK_SIZE)?;
        Ok(from_words(encipher(self.key()?, to_words(block))).to_vec())
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        check_block(block, Self::BLOCK_SIZE)?;
        Ok(from_words(decipher(self.key()?, to_words(block))).to_vec())
    }

    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }
}

/// 128-bit block cipher: three Feistel rounds whose round function is XTEA
/// under a per-round tweak of the key.
#[derive(Debug, Clone, Default)]
pub struct XteaWide {
    round_keys: Option<[Key; 3]>,
}

impl XteaWide {
    pub const BLOCK_SIZE: usize = 16;

    pub fn new(key: &[u8]) -> Result<Self, BlockCipherError> {
        let mut cipher = Self::default();
        cipher.set_encryption_key(key)?;
        Ok(cipher)
    }

    fn round(key: &Key, input: &[u8], target: &mut [u8]) {
        let f = from_words(encipher(key, to_words(input)));
        for (t, k) in target.iter_mut().zip(f.iter()) {
            *t ^= k;
        }
    }

    fn keys(&self) -> Result<&[Key; 3], BlockCipherError> {
        self.round_keys.as_ref().ok_or(BlockCipherError::KeyNotSet)
    }
}

impl BlockCipher for XteaWide {
    fn set_encryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError> {
        let base = parse_key(key)?;
        let mut keys = [base; 3];
        for (i, k) in keys.iter_mut().enumerate() {
            k[0] ^= i as u32 + 1;
        }
        self.round_keys = Some(keys);
        Ok(())
    }

    fn set_decryption_key(&mut self, key: &[u8]) -> Result<(), BlockCipherError> {
        self.set_encryption_key(key)
    }

    fn encrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        check_block(block, Self::BLOCK_SIZE)?;
        let keys = self.keys()?;
        let mut out = block.to_vec();
        let (left, right) = out.split_at_mut(8);
        Self::round(&keys[0], left, right);
        Self::round(&keys[1], right, left);
        Self::round(&keys[2], left, right);
        Ok(out)
    }

    fn decrypt_block(&self, block: &[u8]) -> Result<Vec<u8>, BlockCipherError> {
        check_block(block, Self::BLOCK_SIZE)?;
        let keys = self.keys()?;
        let mut out = block.to_vec();
        let (left, right) = out.split_at_mut(8);
        Self::round(&keys[2], left, right);
        Self::round(&keys[1], right, left);
        Self::round(&keys[0], left, right);
        Ok(out)
    }

    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }
}
