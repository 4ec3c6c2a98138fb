// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sharded idempotency store (§4.5): a map from message id to a cached,
//! serialized result, with time-based retention.
//!
//! Sharding is the core performance decision here (§4.5): each shard owns an
//! independent `parking_lot::RwLock`-guarded map, so marks on distinct ids in
//! different shards never contend. This isn't lock-free in the strict
//! wait-free sense — the workspace this was built alongside reaches for
//! `parking_lot` rather than a lock-free map crate everywhere it needs
//! concurrent maps, so the shard count is the knob that buys the scaling the
//! spec asks for instead.

use relay_adapters::Serializer;
use relay_core::{Clock, MessageId, RelayError, RelayResult, RelayResultOf, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

struct Record {
    bytes: Vec<u8>,
    type_tag: String,
    completed_at_ms: u64,
}

struct Shard {
    map: parking_lot::RwLock<std::collections::HashMap<i64, Record>>,
}

/// Sharded, in-memory idempotency store (§4.5).
pub struct IdempotencyStore<C: Clock = SystemClock> {
    shards: Vec<Shard>,
    shard_mask: i64,
    retention: Duration,
    clock: C,
}

impl IdempotencyStore<SystemClock> {
    pub fn new(shard_count: usize, retention: Duration) -> RelayResultOf<Self> {
        Self::with_clock(shard_count, retention, SystemClock)
    }
}

impl<C: Clock> IdempotencyStore<C> {
    pub fn with_clock(shard_count: usize, retention: Duration, clock: C) -> RelayResultOf<Self> {
        if shard_count == 0 || !shard_count.is_power_of_two() {
            return Err(RelayError::validation(format!(
                "idempotency shard count must be a power of two, got {shard_count}"
            )));
        }
        let shards = (0..shard_count)
            .map(|_| Shard { map: parking_lot::RwLock::new(std::collections::HashMap::new()) })
            .collect();
        Ok(Self { shards, shard_mask: shard_count as i64 - 1, retention, clock })
    }

    fn shard_for(&self, message_id: i64) -> &Shard {
        // `id & (N-1)` in place of modulo, per §4.5 and §9 — N is a power of
        // two so the mask clears everything above bit log2(N), always
        // yielding a value in 0..N regardless of the id's sign.
        let idx = (message_id & self.shard_mask) as usize;
        &self.shards[idx]
    }

    fn is_fresh(&self, record: &Record) -> bool {
        let now = self.clock.epoch_ms();
        now.saturating_sub(record.completed_at_ms) <= self.retention.as_millis() as u64
    }

    pub fn has_been_processed(&self, message_id: MessageId) -> bool {
        let shard = self.shard_for(message_id.value());
        match shard.map.read().get(&message_id.value()) {
            Some(record) => self.is_fresh(record),
            None => false,
        }
    }

    /// Serializes `value` and stores it keyed by `message_id`, overwriting
    /// any previous record (§4.5 — last-writer-wins).
    pub fn mark_as_processed<S: Serializer + ?Sized, T: Serialize>(
        &self,
        serializer: &S,
        message_id: MessageId,
        value: &T,
        type_tag: &str,
    ) -> RelayResult {
        let bytes = serializer.serialize(value, type_tag)?;
        self.insert_record(message_id, bytes, type_tag.to_string());
        Ok(())
    }

    /// Records that `message_id` was processed without producing a value
    /// (§4.5 edge case — a command's `Result` with no `V`).
    pub fn mark_as_processed_without_value(&self, message_id: MessageId) {
        self.insert_record(message_id, Vec::new(), String::new());
    }

    fn insert_record(&self, message_id: MessageId, bytes: Vec<u8>, type_tag: String) {
        let record = Record { bytes, type_tag, completed_at_ms: self.clock.epoch_ms() };
        let shard = self.shard_for(message_id.value());
        shard.map.write().insert(message_id.value(), record);
    }

    /// Returns the cached value iff the stored type tag matches `type_tag`
    /// and the record hasn't expired (§4.5).
    pub fn get_cached_result<S: Serializer + ?Sized, T: DeserializeOwned>(
        &self,
        serializer: &S,
        message_id: MessageId,
        type_tag: &str,
    ) -> Option<T> {
        let shard = self.shard_for(message_id.value());
        let map = shard.map.read();
        let record = map.get(&message_id.value())?;
        if !self.is_fresh(record) || record.type_tag != type_tag {
            return None;
        }
        serializer.deserialize(&record.bytes, type_tag).ok()
    }
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
