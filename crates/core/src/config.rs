// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mediator configuration (§6), loadable from TOML the way the rest of the
//! workspace's config layer works.

use crate::result::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_circuit_breaker_threshold() -> u32 {
    5
}

fn default_circuit_breaker_duration_ms() -> u64 {
    30_000
}

fn default_idempotency_shard_count() -> usize {
    16
}

fn default_idempotency_retention_ms() -> u64 {
    24 * 60 * 60 * 1000
}

/// Options recognized by the core (§6), deserializable from a host's TOML
/// config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// If set and >0, event fan-out is gated by a limiter of this size.
    pub max_event_handler_concurrency: Option<usize>,
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_threshold: u32,
    #[serde(
        rename = "circuit_breaker_duration_ms",
        default = "default_circuit_breaker_duration_ms"
    )]
    circuit_breaker_duration_ms: u64,
    #[serde(default = "default_idempotency_shard_count")]
    pub idempotency_shard_count: usize,
    #[serde(rename = "idempotency_retention_ms", default = "default_idempotency_retention_ms")]
    idempotency_retention_ms: u64,
    #[serde(default)]
    pub id_generator_worker_id: u8,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_event_handler_concurrency: None,
            circuit_breaker_threshold: default_circuit_breaker_threshold(),
            circuit_breaker_duration_ms: default_circuit_breaker_duration_ms(),
            idempotency_shard_count: default_idempotency_shard_count(),
            idempotency_retention_ms: default_idempotency_retention_ms(),
            id_generator_worker_id: 0,
        }
    }
}

impl RelayConfig {
    pub fn circuit_breaker_duration(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_duration_ms)
    }

    pub fn set_circuit_breaker_duration(&mut self, d: Duration) {
        self.circuit_breaker_duration_ms = d.as_millis() as u64;
    }

    pub fn idempotency_retention(&self) -> Duration {
        Duration::from_millis(self.idempotency_retention_ms)
    }

    pub fn set_idempotency_retention(&mut self, d: Duration) {
        self.idempotency_retention_ms = d.as_millis() as u64;
    }

    /// Parse and validate a config document. Validation failures surface as
    /// `RelayErrorCode::ValidationFailed` rather than panicking (§10.3).
    pub fn parse_toml(s: &str) -> Result<Self, RelayError> {
        let config: RelayConfig = toml::from_str(s)
            .map_err(|e| RelayError::validation(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RelayResult {
        if !self.idempotency_shard_count.is_power_of_two() || self.idempotency_shard_count == 0 {
            return Err(RelayError::validation(format!(
                "idempotency_shard_count must be a power of two, got {}",
                self.idempotency_shard_count
            )));
        }
        if let Some(0) = self.max_event_handler_concurrency {
            // 0 is treated as "unset" per §6, not an error — normalize below.
        }
        Ok(())
    }

    /// `0` and `None` both mean "no limit" per §6; normalize to `None`.
    pub fn effective_max_event_handler_concurrency(&self) -> Option<usize> {
        self.max_event_handler_concurrency.filter(|&n| n > 0)
    }
}
