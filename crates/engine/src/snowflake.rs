// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snowflake-style 63-bit ID generator (§4.9, §6 ID format).
//!
//! Layout: bits [62..22] ms since epoch, bits [21..14] worker id, bits
//! [13..0] sequence. Monotonic within (worker, ms); sequence overflow within
//! a millisecond busy-waits for the next tick.

use relay_core::{Clock, MessageId, RelayError, RelayResultOf, SystemClock};
use std::sync::atomic::{AtomicI64, Ordering};

const TIMESTAMP_SHIFT: u32 = 22;
const WORKER_ID_SHIFT: u32 = 14;
const SEQUENCE_BITS: u32 = 14;
const SEQUENCE_MASK: u32 = (1 << SEQUENCE_BITS) - 1;
const WORKER_ID_MASK: u64 = (1 << 8) - 1;

/// Generates strictly increasing 63-bit positive ids within a single
/// (worker_id, process) pair (§4.9).
///
/// `last_ms` and `sequence` are packed into a single atomic word so the
/// millisecond rollover and the sequence reset happen in one CAS — keeping
/// them as two separate atomics would let a concurrent caller observe the
/// new millisecond with the still-stale (pre-reset) sequence value and hand
/// out an id that compares lower than one returned just before it.
pub struct SnowflakeGenerator<C: Clock = SystemClock> {
    worker_id: u8,
    state: AtomicI64,
    clock: C,
}

/// `0` means "no id issued yet"; real epoch-ms readings are always > 0, so
/// this sentinel never collides with a packed `(ms, sequence)` pair.
const UNINITIALIZED: i64 = 0;

fn pack(ms: i64, sequence: u32) -> i64 {
    (ms << SEQUENCE_BITS) | sequence as i64
}

fn unpack(state: i64) -> (i64, u32) {
    (state >> SEQUENCE_BITS, (state & SEQUENCE_MASK as i64) as u32)
}

impl SnowflakeGenerator<SystemClock> {
    pub fn new(worker_id: u8) -> Self {
        Self::with_clock(worker_id, SystemClock)
    }
}

impl<C: Clock> SnowflakeGenerator<C> {
    pub fn with_clock(worker_id: u8, clock: C) -> Self {
        Self { worker_id, state: AtomicI64::new(UNINITIALIZED), clock }
    }

    /// Produces the next id. Busy-waits across the millisecond boundary on
    /// sequence overflow (§4.9); errors if the clock observably moves
    /// backwards rather than silently reusing a stale timestamp.
    pub fn next_id(&self) -> RelayResultOf<MessageId> {
        loop {
            let now_ms = self.clock.epoch_ms() as i64;
            let prev = self.state.load(Ordering::Acquire);
            let initialized = prev != UNINITIALIZED;
            let (last_ms, last_seq) = unpack(prev);

            if initialized && now_ms < last_ms {
                return Err(RelayError::internal(format!(
                    "clock moved backwards: last={last_ms}ms now={now_ms}ms"
                )));
            }

            let (next_ms, next_seq) = if initialized && now_ms == last_ms {
                let seq = (last_seq + 1) & SEQUENCE_MASK;
                if seq == 0 {
                    // Sequence space for this millisecond is exhausted; spin
                    // until the clock ticks over.
                    std::hint::spin_loop();
                    continue;
                }
                (now_ms, seq)
            } else {
                (now_ms, 0)
            };

            let next_state = pack(next_ms, next_seq);
            if self
                .state
                .compare_exchange(prev, next_state, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(self.compose(next_ms, next_seq));
            }
            // Lost the race to another concurrent caller; retry with fresh state.
        }
    }

    fn compose(&self, ms: i64, sequence: u32) -> MessageId {
        let id = (ms << TIMESTAMP_SHIFT)
            | ((self.worker_id as i64 & WORKER_ID_MASK as i64) << WORKER_ID_SHIFT)
            | sequence as i64;
        MessageId::new(id)
    }
}

#[cfg(test)]
#[path = "snowflake_tests.rs"]
mod tests;
