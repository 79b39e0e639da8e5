//! `CipherContext`: one cipher bound to a mode, a padding scheme and an IV.
//!
//! The context is immutable once built and clones share the cipher, the IV
//! and the randomness source, so handing a copy to each worker is cheap.
//! Key changes go through `cipher_mut`, which only succeeds while no other
//! clone is alive.

pub mod asynchronous;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::crypto::modes::{self, ModeContext};
use crate::crypto::padding;
use crate::crypto::random::{OsRandom, RandomSource};
use crate::crypto::types::{BlockCipher, CipherError, CipherMode, PaddingMode};

pub use asynchronous::CipherTask;

/// Opaque per-mode options. None of the built-in modes read them; they are
/// carried so custom callers can stash parameters alongside the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeOptions {
    entries: Arc<BTreeMap<String, Bytes>>,
}

impl ModeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Arc::make_mut(&mut self.entries).insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[derive(Clone)]
pub struct CipherContext {
    cipher: Arc<dyn BlockCipher>,
    mode: CipherMode,
    padding: PaddingMode,
    block_size: usize,
    iv: Option<Bytes>,
    options: ModeOptions,
    rng: Arc<dyn RandomSource>,
    block_workers: usize,
}

impl fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .field("block_size", &self.block_size)
            .field("iv_len", &self.iv.as_ref().map(Bytes::len))
            .field("options", &self.options.len())
            .field("block_workers", &self.block_workers)
            .finish_non_exhaustive()
    }
}

impl CipherContext {
    /// Bind `cipher` with the OS randomness source and default block-level
    /// parallelism. The IV is checked when an operation needs it.
    pub fn new<C>(cipher: C, mode: CipherMode, padding: PaddingMode, iv: Option<&[u8]>) -> Result<Self, CipherError>
    where
        C: BlockCipher + 'static,
    {
        let mut builder = CipherContextBuilder::new().cipher(cipher).mode(mode).padding(padding);
        if let Some(iv) = iv {
            builder = builder.iv(iv);
        }
        builder.build()
    }

    /// Construct from the stable numeric tags of `CipherMode` and `PaddingMode`.
    pub fn from_tags<C>(cipher: C, mode_tag: u8, padding_tag: u8, iv: Option<&[u8]>) -> Result<Self, CipherError>
    where
        C: BlockCipher + 'static,
    {
        let mode = CipherMode::try_from(mode_tag)?;
        let padding = PaddingMode::try_from(padding_tag)?;
        Self::new(cipher, mode, padding, iv)
    }

    pub fn builder() -> CipherContextBuilder {
        CipherContextBuilder::new()
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn padding(&self) -> PaddingMode {
        self.padding
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    pub fn options(&self) -> &ModeOptions {
        &self.options
    }

    pub fn block_workers(&self) -> usize {
        self.block_workers
    }

    /// Same context with a different cap on block-level threads.
    pub fn with_block_workers(mut self, workers: usize) -> Self {
        self.block_workers = workers.max(1);
        self
    }

    /// Exclusive access to the cipher for key changes.
    ///
    /// Returns `None` while any clone of this context (a stream worker, an
    /// async task) still shares the cipher.
    pub fn cipher_mut(&mut self) -> Option<&mut (dyn BlockCipher + 'static)> {
        Arc::get_mut(&mut self.cipher)
    }

    /// Install `key` for both directions.
    pub fn rekey(&mut self, key: &[u8]) -> Result<(), CipherError> {
        let cipher = self.cipher_mut().ok_or_else(|| {
            CipherError::Configuration("cipher is shared with another context clone".into())
        })?;
        cipher.set_encryption_key(key)?;
        cipher.set_decryption_key(key)?;
        Ok(())
    }

    /// Exact ciphertext size for `plain_len` bytes of plaintext.
    pub fn ciphertext_len(&self, plain_len: usize) -> usize {
        padding::padded_len(plain_len, self.block_size, self.padding) + self.mode.prefix_len(self.block_size)
    }

    fn mode_ctx(&self) -> ModeContext<'_> {
        ModeContext {
            cipher: self.cipher.as_ref(),
            block_size: self.block_size,
            iv: self.iv.as_deref(),
            rng: self.rng.as_ref(),
            workers: self.block_workers,
        }
    }

    /// Pad and encrypt the whole buffer.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let padded = padding::apply(plaintext, self.block_size, self.padding, self.rng.as_ref())?;
        let out = modes::encrypt(self.mode, &self.mode_ctx(), &padded)?;
        debug!(mode = %self.mode, padding = %self.padding, plain = plaintext.len(), cipher = out.len(), "encrypt");
        Ok(out)
    }

    /// Decrypt the whole buffer and strip its padding.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() % self.block_size != 0 {
            return Err(CipherError::Input(format!(
                "ciphertext length {} is not a multiple of block size {}",
                ciphertext.len(),
                self.block_size
            )));
        }
        let padded = modes::decrypt(self.mode, &self.mode_ctx(), ciphertext)?;
        let out = padding::remove(&padded, self.block_size, self.padding)?;
        debug!(mode = %self.mode, padding = %self.padding, cipher = ciphertext.len(), plain = out.len(), "decrypt");
        Ok(out)
    }
}

/// Step-by-step construction with optional IV, options and randomness.
#[derive(Default)]
pub struct CipherContextBuilder {
    cipher: Option<Arc<dyn BlockCipher>>,
    mode: Option<CipherMode>,
    padding: Option<PaddingMode>,
    iv: Option<Bytes>,
    options: ModeOptions,
    rng: Option<Arc<dyn RandomSource>>,
    block_workers: Option<usize>,
}

impl CipherContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cipher<C: BlockCipher + 'static>(mut self, cipher: C) -> Self {
        self.cipher = Some(Arc::new(cipher));
        self
    }

    pub fn shared_cipher(mut self, cipher: Arc<dyn BlockCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn mode(mut self, mode: CipherMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn padding(mut self, padding: PaddingMode) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn iv(mut self, iv: &[u8]) -> Self {
        self.iv = Some(Bytes::copy_from_slice(iv));
        self
    }

    pub fn options(mut self, options: ModeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn random_source<R: RandomSource + 'static>(mut self, rng: R) -> Self {
        self.rng = Some(Arc::new(rng));
        self
    }

    pub fn block_workers(mut self, workers: usize) -> Self {
        self.block_workers = Some(workers);
        self
    }

    /// Defaults: ECB, PKCS7, OS randomness, one block worker per CPU.
    pub fn build(self) -> Result<CipherContext, CipherError> {
        let cipher = self
            .cipher
            .ok_or_else(|| CipherError::Configuration("no block cipher bound".into()))?;
        let block_size = cipher.block_size();
        if block_size == 0 {
            return Err(CipherError::Configuration("block cipher reports a zero block size".into()));
        }

        Ok(CipherContext {
            cipher,
            mode: self.mode.unwrap_or(CipherMode::Ecb),
            padding: self.padding.unwrap_or(PaddingMode::Pkcs7),
            block_size,
            iv: self.iv,
            options: self.options,
            rng: self.rng.unwrap_or_else(|| Arc::new(OsRandom)),
            block_workers: self.block_workers.unwrap_or_else(num_cpus::get).max(1),
        })
    }
}
