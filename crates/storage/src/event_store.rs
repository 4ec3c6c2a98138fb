// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, per-stream event store with optimistic concurrency (§4.6).
//!
//! Each stream gets its own `RwLock<Vec<_>>`; the outer map only needs a
//! read lock to look a stream up, so appends to stream A never contend with
//! appends to stream B. Within a stream, appends are fully linearized by the
//! stream's write lock — versions are always contiguous from 0.

use relay_core::{Clock, RelayError, RelayResultOf, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;

/// A single event as it sits in the log, along with its assigned version and
/// wall-clock append time (§4.6).
#[derive(Debug, Clone)]
pub struct StoredEvent<E> {
    pub version: i64,
    pub event: E,
    pub appended_at_ms: u64,
}

/// Pass to [`EventStore::append`] to mean "I don't know the current version,
/// append unconditionally" (§4.6 — no optimistic check).
pub const ANY_VERSION: i64 = -1;

struct Stream<E> {
    events: parking_lot::RwLock<Vec<StoredEvent<E>>>,
}

impl<E> Default for Stream<E> {
    fn default() -> Self {
        Self { events: parking_lot::RwLock::new(Vec::new()) }
    }
}

/// In-memory append-only event store, sharded by stream id (§4.6).
pub struct EventStore<E, C: Clock = SystemClock> {
    streams: parking_lot::RwLock<HashMap<String, Arc<Stream<E>>>>,
    clock: C,
}

impl<E: Clone> EventStore<E, SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<E: Clone> Default for EventStore<E, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone, C: Clock> EventStore<E, C> {
    pub fn with_clock(clock: C) -> Self {
        Self { streams: parking_lot::RwLock::new(HashMap::new()), clock }
    }

    fn stream_for(&self, stream_id: &str) -> Arc<Stream<E>> {
        if let Some(stream) = self.streams.read().get(stream_id) {
            return stream.clone();
        }
        let mut streams = self.streams.write();
        streams.entry(stream_id.to_string()).or_default().clone()
    }

    /// Appends `events` to `stream_id`. `expected_version` must equal the
    /// stream's current head version, or [`ANY_VERSION`] to skip the check
    /// (§4.6). Returns the new head version.
    pub fn append(
        &self,
        stream_id: &str,
        events: Vec<E>,
        expected_version: i64,
    ) -> RelayResultOf<i64> {
        if events.is_empty() {
            return Err(RelayError::validation("append requires at least one event"));
        }
        let stream = self.stream_for(stream_id);
        let mut log = stream.events.write();
        let current_version = log.len() as i64 - 1;
        if expected_version != ANY_VERSION && expected_version != current_version {
            return Err(RelayError::concurrency_conflict(
                stream_id,
                expected_version,
                current_version,
            ));
        }
        let now = self.clock.epoch_ms();
        let mut next_version = current_version;
        for event in events {
            next_version += 1;
            log.push(StoredEvent { version: next_version, event, appended_at_ms: now });
        }
        Ok(next_version)
    }

    /// Current head version of `stream_id`, or `-1` if the stream doesn't
    /// exist or is empty.
    pub fn version(&self, stream_id: &str) -> i64 {
        match self.streams.read().get(stream_id) {
            Some(stream) => stream.events.read().len() as i64 - 1,
            None => -1,
        }
    }

    /// Reads events from `stream_id` starting at `from_version` (inclusive),
    /// up to `max_count` events (`None` for unlimited). Returns the events
    /// plus the stream's head version as of the read (§4.6).
    pub fn read(
        &self,
        stream_id: &str,
        from_version: i64,
        max_count: Option<usize>,
    ) -> (Vec<StoredEvent<E>>, i64) {
        let Some(stream) = self.streams.read().get(stream_id).cloned() else {
            return (Vec::new(), -1);
        };
        let log = stream.events.read();
        let head_version = log.len() as i64 - 1;
        let from = from_version.max(0) as usize;
        let events: Vec<_> = match max_count {
            Some(n) => log.iter().skip(from).take(n).cloned().collect(),
            None => log.iter().skip(from).cloned().collect(),
        };
        (events, head_version)
    }

    /// Reads events up to and including `to_version` (§4.6).
    pub fn read_to_version(&self, stream_id: &str, to_version: i64) -> Vec<StoredEvent<E>> {
        let Some(stream) = self.streams.read().get(stream_id).cloned() else {
            return Vec::new();
        };
        stream
            .events
            .read()
            .iter()
            .filter(|e| e.version <= to_version)
            .cloned()
            .collect()
    }

    /// Reads events appended at or before `timestamp_ms` (§4.6).
    pub fn read_to_timestamp(&self, stream_id: &str, timestamp_ms: u64) -> Vec<StoredEvent<E>> {
        let Some(stream) = self.streams.read().get(stream_id).cloned() else {
            return Vec::new();
        };
        stream
            .events
            .read()
            .iter()
            .filter(|e| e.appended_at_ms <= timestamp_ms)
            .cloned()
            .collect()
    }

    /// All stream ids known to the store, in no particular order.
    pub fn stream_ids(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "event_store_tests.rs"]
mod tests;
