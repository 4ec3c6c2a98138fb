// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency admission control (§4.3). Built on `tokio::sync::Semaphore`,
//! which already gives FIFO waiter ordering and never leaks a permit when a
//! waiter is cancelled — the properties §4.3 asks for come from the runtime
//! primitive rather than a hand-rolled queue.

use relay_core::{RelayError, RelayResultOf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

/// A held admission slot. Releasing is just dropping the permit — Rust's
/// ownership model makes "double release" a compile-time impossibility
/// rather than a runtime hazard to guard against (§4.3's "double release is
/// an error the caller must avoid" is moot here: there is no value left to
/// release twice once it has been consumed).
pub struct Permit(#[allow(dead_code)] tokio::sync::OwnedSemaphorePermit);

impl Permit {
    /// Explicit release, for call sites that want symmetry with `acquire`.
    /// Equivalent to dropping the permit.
    pub fn release(self) {
        drop(self);
    }
}

/// Bounded admission control for event fan-out (§4.3). One instance per
/// mediator when `max_event_handler_concurrency` is configured.
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimiter {
    pub fn new(max: usize) -> RelayResultOf<Self> {
        if max == 0 {
            return Err(RelayError::validation("concurrency limiter max must be > 0"));
        }
        Ok(Self { semaphore: Arc::new(Semaphore::new(max)), max })
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Blocks until a permit is free or `cancel` fires (§4.3).
    pub async fn acquire(&self, cancel: &CancellationToken) -> RelayResultOf<Permit> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RelayError::cancelled()),
            res = self.semaphore.clone().acquire_owned() => {
                res.map(Permit).map_err(|_| RelayError::internal("concurrency limiter semaphore closed"))
            }
        }
    }

    /// Non-blocking; `None` if no permit is immediately available.
    pub fn try_acquire(&self) -> Option<Permit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Some(Permit(permit)),
            Err(TryAcquireError::NoPermits) => None,
            Err(TryAcquireError::Closed) => None,
        }
    }

    /// Bounded wait; `Ok(None)` on elapsed timeout (not an error — the caller
    /// asked for a bound, and the bound was respected).
    pub async fn try_acquire_timeout(&self, timeout: Duration) -> RelayResultOf<Option<Permit>> {
        match tokio::time::timeout(timeout, self.semaphore.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(Some(Permit(permit))),
            Ok(Err(_)) => Err(RelayError::internal("concurrency limiter semaphore closed")),
            Err(_elapsed) => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
