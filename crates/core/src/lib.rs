// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: data model for the in-process message mediator — the message
//! envelope, the Result sum type and error taxonomy, handler lifetimes, and
//! configuration (spec §3, §6, §7).

pub mod macros;

pub mod clock;
pub mod config;
pub mod handler;
pub mod id;
pub mod message;
pub mod result;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::RelayConfig;
pub use handler::HandlerLifetime;
pub use id::Scope;
pub use message::{Command, CorrelationId, Envelope, EventMessage, Message, MessageId, MessageKind, Qos, Request};
pub use result::{RelayError, RelayErrorCode, RelayResult, RelayResultOf};
