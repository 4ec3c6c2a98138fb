// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message envelope (§3): requests, commands, and events all carry one.

use crate::define_int_id;

define_int_id! {
    /// Monotonically increasing 63-bit id, unique per process (§3, §4.9).
    pub struct MessageId;
}

define_int_id! {
    /// Ties a chain of messages into one trace (§3).
    pub struct CorrelationId;
}

/// Delivery guarantee requested by the producer (§3). Does not itself change
/// dispatch semantics — it is a hint external transports/adapters observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// The three message shapes dispatched by the engine (§1, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MessageKind {
    Request,
    Command,
    Event,
}

/// Envelope metadata shared by every message the engine dispatches.
///
/// Messages are immutable after construction (§3): `Envelope` has no public
/// mutators, only a builder.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub message_id: MessageId,
    pub correlation_id: Option<CorrelationId>,
    pub type_tag: String,
    pub kind: MessageKind,
    pub qos: Qos,
}

impl Envelope {
    pub fn new(message_id: MessageId, type_tag: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            message_id,
            correlation_id: None,
            type_tag: type_tag.into(),
            kind,
            qos: Qos::AtMostOnce,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }
}

/// Implemented by every request/command/event payload type so the engine can
/// resolve handlers by type tag rather than runtime type inspection (§9).
pub trait Message: Send + Sync + 'static {
    /// Stable string identifying this message's shape to the registry.
    /// Conventionally the type's name, e.g. `"CreateOrderCmd"`.
    fn type_tag() -> &'static str
    where
        Self: Sized;
}

/// Implemented by request payload types; `Response` is the value carried by
/// the request's `Result<Response>` (§3, §4.1 `send_request`).
pub trait Request: Message {
    type Response: Send + Sync + 'static;
}

/// Implemented by command payload types (a request without a response).
pub trait Command: Message {}

/// Implemented by event payload types (zero-or-more handlers, no response).
pub trait EventMessage: Message + Clone {}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
