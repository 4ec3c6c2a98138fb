// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker (§4.4): Closed / Open / HalfOpen, driven by atomic
//! counters and CAS so a handler invocation never holds a lock across the
//! state check (§5).

use relay_core::{Clock, RelayError, RelayResultOf, SystemClock};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::time::Duration;

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const HALF_OPEN: u8 = 2;

/// Observable breaker state (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl From<u8> for BreakerState {
    fn from(v: u8) -> Self {
        match v {
            OPEN => BreakerState::Open,
            HALF_OPEN => BreakerState::HalfOpen,
            _ => BreakerState::Closed,
        }
    }
}

/// Per-handler (or per-mediator) circuit breaker (§4.4).
pub struct CircuitBreaker<C: Clock = SystemClock> {
    state: AtomicU8,
    failure_count: AtomicU32,
    opened_at_ms: AtomicU64,
    threshold: u32,
    cooldown: Duration,
    clock: C,
}

impl CircuitBreaker<SystemClock> {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self::with_clock(threshold, cooldown, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(threshold: u32, cooldown: Duration, clock: C) -> Self {
        Self {
            state: AtomicU8::new(CLOSED),
            failure_count: AtomicU32::new(0),
            opened_at_ms: AtomicU64::new(0),
            threshold: threshold.max(1),
            cooldown,
            clock,
        }
    }

    pub fn state(&self) -> BreakerState {
        BreakerState::from(self.state.load(Ordering::Acquire))
    }

    /// Gate to call before invoking a handler. `Ok(())` means proceed;
    /// `Err` means short-circuit with a retryable `circuit_open` error
    /// (§4.1, §4.4).
    pub fn before_call(&self) -> RelayResultOf<()> {
        loop {
            match self.state.load(Ordering::Acquire) {
                CLOSED => return Ok(()),
                OPEN => {
                    let opened_at = self.opened_at_ms.load(Ordering::Acquire);
                    let now = self.clock.epoch_ms();
                    if now.saturating_sub(opened_at) < self.cooldown.as_millis() as u64 {
                        return Err(RelayError::circuit_open());
                    }
                    if self
                        .state
                        .compare_exchange(OPEN, HALF_OPEN, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        tracing::info!("circuit breaker transition: Open -> HalfOpen (probe admitted)");
                        return Ok(());
                    }
                    // lost the race to another probe; re-read state and retry.
                }
                HALF_OPEN => {
                    // Only the probe that won the Open->HalfOpen CAS proceeds;
                    // every other concurrent attempt while HalfOpen short-circuits.
                    return Err(RelayError::circuit_open());
                }
                _ => unreachable!("circuit breaker state is one of CLOSED/OPEN/HALF_OPEN"),
            }
        }
    }

    /// Report a successful handler invocation (§4.4).
    pub fn on_success(&self) {
        match self.state.load(Ordering::Acquire) {
            CLOSED => self.failure_count.store(0, Ordering::Release),
            HALF_OPEN => {
                self.failure_count.store(0, Ordering::Release);
                self.state.store(CLOSED, Ordering::Release);
                tracing::info!("circuit breaker transition: HalfOpen -> Closed");
            }
            _ => {}
        }
    }

    /// Report a failed handler invocation (§4.4).
    pub fn on_failure(&self) {
        match self.state.load(Ordering::Acquire) {
            CLOSED => {
                let count = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                if count >= self.threshold {
                    self.open();
                }
            }
            HALF_OPEN => self.open(),
            _ => {}
        }
    }

    fn open(&self) {
        self.opened_at_ms.store(self.clock.epoch_ms(), Ordering::Release);
        self.state.store(OPEN, Ordering::Release);
        tracing::info!("circuit breaker transition: -> Open");
    }
}

#[cfg(test)]
#[path = "circuit_breaker_tests.rs"]
mod tests;
