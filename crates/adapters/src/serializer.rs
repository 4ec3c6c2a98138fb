// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The serializer contract (§6): what the idempotency store consumes to
//! turn a handler's typed result into bytes and back.

use relay_core::{RelayError, RelayResultOf};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Round-trips a typed value through bytes, keyed by the value's type tag
/// (§6). Failures surface as `RelayErrorCode::SerializationFailed`, never a
/// panic.
pub trait Serializer: Send + Sync + 'static {
    fn serialize<T: Serialize>(&self, value: &T, type_tag: &str) -> RelayResultOf<Vec<u8>>;
    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8], type_tag: &str) -> RelayResultOf<T>;
}

/// JSON serializer, the default for the in-memory idempotency store — every
/// other crate in this workspace reaches for `serde_json` for this.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize>(&self, value: &T, type_tag: &str) -> RelayResultOf<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| RelayError::serialization(format!("serializing `{type_tag}`: {e}")))
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8], type_tag: &str) -> RelayResultOf<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| RelayError::serialization(format!("deserializing `{type_tag}`: {e}")))
    }
}
