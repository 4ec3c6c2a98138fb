// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-adapters: the registry and serializer contracts the dispatch engine
//! consumes from the host (§6), plus in-memory reference implementations of
//! each suitable for tests and small hosts.

pub mod handler;
pub mod registry;
pub mod serializer;

pub use handler::{CommandHandler, EventHandler, RequestHandler};
pub use registry::Registry;
#[cfg(any(test, feature = "test-support"))]
pub use registry::InMemoryRegistry;
pub use serializer::{JsonSerializer, Serializer};
