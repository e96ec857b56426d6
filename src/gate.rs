//! Bounded-concurrency gate.
//!
//! Limits how many callers may run a guarded section at once. Callers beyond the
//! limit wait in strict FIFO order (tokio's semaphore is fair) and are admitted as
//! earlier holders release. A permit is released when it is dropped, so every
//! acquisition is paired with exactly one release on all exit paths.
//!
//! Without a wait timeout a holder that never finishes starves everyone queued
//! behind it. `with_timeout` bounds the wait for deployments that prefer a 503
//! over an indefinite stall.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("timed out after {0:?} waiting for a free slot")]
    Timeout(Duration),
    #[error("gate closed")]
    Closed,
}

/// Counting admission gate shared across handlers.
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    max: usize,
    waiting: Arc<AtomicUsize>,
    wait_timeout: Option<Duration>,
}

/// Held while inside the guarded section. Dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Decrements the waiter count even if the acquiring future is cancelled.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `max` concurrent holders (minimum 1).
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
            waiting: Arc::new(AtomicUsize::new(0)),
            wait_timeout: None,
        }
    }

    /// Bound how long `acquire` may wait for a slot.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Wait for a slot. Resolves immediately while fewer than `max` are active.
    pub async fn acquire(&self) -> Result<GatePermit, GateError> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            return Ok(GatePermit { _permit: permit });
        }

        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _waiting = WaitingGuard(&self.waiting);

        let acquire = self.semaphore.clone().acquire_owned();
        let permit = match self.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, acquire)
                .await
                .map_err(|_| GateError::Timeout(limit))?,
            None => acquire.await,
        }
        .map_err(|_| GateError::Closed)?;

        Ok(GatePermit { _permit: permit })
    }

    /// Number of callers currently inside the guarded section.
    pub fn active(&self) -> usize {
        self.max - self.semaphore.available_permits()
    }

    /// Number of callers queued in `acquire`.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}
