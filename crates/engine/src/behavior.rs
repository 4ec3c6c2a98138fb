// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-cutting behaviors (§4.1 "fast path vs pipelined execution"):
//! host-supplied wrappers composed around a handler in registration order.
//! With zero registered behaviors the engine calls the handler directly;
//! composing a chain only happens when there's something to compose.
//!
//! Event fan-out bypasses the pipeline (§4.1's isolation guarantee already
//! bounds what cross-cutting code can observe per handler, and nothing in
//! §4.1 describes a per-event behavior chain) — behaviors apply to requests
//! and commands only.

use async_trait::async_trait;
use relay_core::{Command, RelayResult, RelayResultOf, Request, Scope};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Continuation a [`RequestBehavior`] calls to invoke the rest of the chain.
pub type RequestNext<'a, Req> =
    Box<dyn FnOnce() -> BoxFuture<'a, RelayResultOf<<Req as Request>::Response>> + Send + 'a>;

/// Continuation a [`CommandBehavior`] calls to invoke the rest of the chain.
pub type CommandNext<'a> = Box<dyn FnOnce() -> BoxFuture<'a, RelayResult> + Send + 'a>;

#[async_trait]
pub trait RequestBehavior<Req: Request>: Send + Sync + 'static {
    async fn handle(
        &self,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
        next: RequestNext<'_, Req>,
    ) -> RelayResultOf<Req::Response>;
}

#[async_trait]
pub trait CommandBehavior<C: Command>: Send + Sync + 'static {
    async fn handle(
        &self,
        command: &C,
        scope: &Scope,
        cancel: &CancellationToken,
        next: CommandNext<'_>,
    ) -> RelayResult;
}

/// What a [`Dispatcher`](crate::dispatcher::Dispatcher) consults to find
/// registered behaviors for a given message type, mirroring the
/// [`Registry`](relay_adapters::Registry) contract for handlers. The default
/// methods return empty lists, which is what keeps a host with no
/// cross-cutting concerns on the fast path.
pub trait Behaviors: Send + Sync + 'static {
    fn request_behaviors<Req: Request>(&self) -> Vec<Arc<dyn RequestBehavior<Req>>> {
        Vec::new()
    }

    fn command_behaviors<C: Command>(&self) -> Vec<Arc<dyn CommandBehavior<C>>> {
        Vec::new()
    }
}

/// The default — no behaviors, every call takes the fast path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBehaviors;

impl Behaviors for NoBehaviors {}

pub(crate) fn invoke_request_chain<'a, Req: Request>(
    index: usize,
    behaviors: &'a [Arc<dyn RequestBehavior<Req>>],
    handler: &'a Arc<dyn relay_adapters::RequestHandler<Req>>,
    request: &'a Req,
    scope: &'a Scope,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, RelayResultOf<Req::Response>> {
    Box::pin(async move {
        if index == behaviors.len() {
            return handler.handle(request, scope, cancel).await;
        }
        let next: RequestNext<'a, Req> = Box::new(move || {
            invoke_request_chain(index + 1, behaviors, handler, request, scope, cancel)
        });
        behaviors[index].handle(request, scope, cancel, next).await
    })
}

pub(crate) fn invoke_command_chain<'a, C: Command>(
    index: usize,
    behaviors: &'a [Arc<dyn CommandBehavior<C>>],
    handler: &'a Arc<dyn relay_adapters::CommandHandler<C>>,
    command: &'a C,
    scope: &'a Scope,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, RelayResult> {
    Box::pin(async move {
        if index == behaviors.len() {
            return handler.handle(command, scope, cancel).await;
        }
        let next: CommandNext<'a> = Box::new(move || {
            invoke_command_chain(index + 1, behaviors, handler, command, scope, cancel)
        });
        behaviors[index].handle(command, scope, cancel, next).await
    })
}

#[cfg(test)]
#[path = "behavior_tests.rs"]
mod tests;
