//! Background encrypt/decrypt delivered as a one-shot future.
//!
//! Each call spawns exactly one OS thread that runs the blocking operation on
//! a clone of the context and sends the outcome through a oneshot channel.
//! The future can be awaited on any executor, or driven with a blocking
//! helper such as `pollster::block_on`. There is no cancellation: dropping
//! the `CipherTask` only discards the result.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use futures::channel::oneshot;
use tracing::warn;

use super::CipherContext;
use crate::crypto::types::CipherError;

/// Pending result of `encrypt_async` / `decrypt_async`.
#[must_use = "a CipherTask does nothing useful unless awaited"]
#[derive(Debug)]
pub struct CipherTask {
    rx: oneshot::Receiver<Result<Vec<u8>, CipherError>>,
}

impl Future for CipherTask {
    type Output = Result<Vec<u8>, CipherError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without a value: the producer thread died.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(CipherError::TaskAborted)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Encrypt,
    Decrypt,
}

impl CipherContext {
    /// Encrypt on a background thread.
    pub fn encrypt_async(&self, plaintext: impl Into<Vec<u8>>) -> CipherTask {
        spawn_task(self.clone(), plaintext.into(), Direction::Encrypt)
    }

    /// Decrypt on a background thread.
    pub fn decrypt_async(&self, ciphertext: impl Into<Vec<u8>>) -> CipherTask {
        spawn_task(self.clone(), ciphertext.into(), Direction::Decrypt)
    }
}

fn spawn_task(ctx: CipherContext, input: Vec<u8>, direction: Direction) -> CipherTask {
    let (tx, rx) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name(format!("blockmode-{direction:?}").to_lowercase())
        .spawn(move || {
            let result = match direction {
                Direction::Encrypt => ctx.encrypt(&input),
                Direction::Decrypt => ctx.decrypt(&input),
            };
            // Receiver gone means the caller dropped the task; nothing to do.
            let _ = tx.send(result);
        });

    if let Err(e) = spawned {
        // The closure, and with it the sender, is dropped: the task resolves
        // to TaskAborted.
        warn!(error = %e, ?direction, "failed to spawn cipher thread");
    }

    CipherTask { rx }
}
