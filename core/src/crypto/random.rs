//! Injected randomness for ISO 10126 padding and the RandomDelta seed block.
//!
//! The context never reaches for a process-global generator: it holds a
//! `RandomSource` so tests can substitute a seeded, reproducible stream.

use std::sync::Mutex;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::crypto::types::CipherError;

/// Capability that fills buffers with random bytes.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CipherError>;
}

/// Operating system CSPRNG. Default for every context.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CipherError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CipherError::Randomness(e.to_string()))
    }
}

/// Deterministic generator for tests and reproducible demos.
/// Not suitable for real key material.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CipherError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CipherError::Randomness("seeded generator poisoned".into()))?;
        rng.fill_bytes(buf);
        Ok(())
    }
}
