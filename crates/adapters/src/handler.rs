// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler traits the dispatch engine invokes (§4.1). These are the "handler
//! instance" the registry contract (§6) hands back.

use async_trait::async_trait;
use relay_core::{Command, Request, Scope};
use relay_core::{RelayResult, RelayResultOf};
use tokio_util::sync::CancellationToken;

/// Handles exactly one request type, returning its typed response (§4.1
/// `send_request`).
#[async_trait]
pub trait RequestHandler<Req: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResultOf<Req::Response>;
}

/// Handles exactly one command type, returning no value (§4.1 `send_command`).
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: &C, scope: &Scope, cancel: &CancellationToken) -> RelayResult;
}

/// Handles one event type. Event handlers never surface an `Err` to the
/// caller (§4.1 — publish never fails); a panicking or failing handler is
/// converted to a swallowed, logged failure by the dispatch engine.
#[async_trait]
pub trait EventHandler<E>: Send + Sync
where
    E: relay_core::EventMessage,
{
    async fn handle(&self, event: &E, scope: &Scope, cancel: &CancellationToken) -> RelayResult;
}
