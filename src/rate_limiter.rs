//! Process-wide request pacing for the remote API
//!
//! Every metadata request goes through one [`RateLimiter`]. A single permit
//! serializes callers in FIFO order, and the holder of the permit waits until
//! at least `interval` has elapsed since the previous call *completed* before
//! starting its own.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Global rate limiter shared by all remote calls
///
/// Cloning is cheap; clones share the permit and the last-call marker.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    /// Capacity 1; tokio semaphores grant permits in request order
    permit: Semaphore,
    interval: Duration,
    /// Completion time of the most recent call
    last_call: Mutex<Option<Instant>>,
    cancel: CancellationToken,
}

/// Stamps the last-call marker when dropped, so a failed or abandoned
/// call still counts against the budget.
struct LastCallStamp<'a> {
    last_call: &'a Mutex<Option<Instant>>,
}

impl Drop for LastCallStamp<'_> {
    fn drop(&mut self) {
        let mut last = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(Instant::now());
    }
}

impl RateLimiter {
    /// Create a limiter enforcing `interval` between consecutive calls
    ///
    /// Once `cancel` fires, queued and future callers get [`Error::ShuttingDown`].
    #[must_use]
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                permit: Semaphore::new(1),
                interval,
                last_call: Mutex::new(None),
                cancel,
            }),
        }
    }

    /// Configured minimum gap between calls
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Completion time of the most recent call, if any
    pub fn last_call(&self) -> Option<Instant> {
        *self
            .inner
            .last_call
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Run `operation` once the permit is free and the interval has elapsed
    ///
    /// The operation's own output (including any error it reports) is
    /// returned untouched; the outer `Err` only signals cancellation.
    pub async fn acquire_and_run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cancel = &self.inner.cancel;
        if cancel.is_cancelled() {
            return Err(Error::ShuttingDown);
        }

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::ShuttingDown),
            permit = self.inner.permit.acquire() => permit.map_err(|_| Error::ShuttingDown)?,
        };

        if let Some(wait) = self.remaining_wait() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit window");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::ShuttingDown),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        // Declared after the permit so it drops first: the marker is stamped
        // before the next caller can observe it.
        let _stamp = LastCallStamp {
            last_call: &self.inner.last_call,
        };
        Ok(operation().await)
    }

    fn remaining_wait(&self) -> Option<Duration> {
        let last = self.last_call()?;
        let elapsed = last.elapsed();
        if elapsed < self.inner.interval {
            Some(self.inner.interval - elapsed)
        } else {
            None
        }
    }
}
