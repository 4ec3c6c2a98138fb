// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compensation helper (§4.7): execute a handler, and on failure publish a
//! compensation event built from the request/command and the error,
//! swallowing any failure to publish it.
//!
//! Offered both as a higher-order function (§4.7 "available... as a
//! higher-order function") for call sites that already hold a
//! [`Dispatcher`], and as wrapper structs any [`RequestHandler`]/
//! [`CommandHandler`] can be built from (§4.7 "available as a base class").

use crate::dispatcher::Dispatcher;
use async_trait::async_trait;
use relay_adapters::{CommandHandler, Registry, RequestHandler};
use relay_core::{Command, EventMessage, RelayError, RelayResult, RelayResultOf, Request, Scope};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs `body`, and on failure builds and publishes a compensation event via
/// `compensate` before returning the original failure (§4.7).
///
/// `compensate` returning `None` skips publication (§4.7 step 2: "If the
/// factory returns null, skip step 3").
pub async fn with_compensation<T, E, R, Fut, MakeEvent>(
    request: &T,
    body: impl FnOnce() -> Fut,
    compensate: MakeEvent,
    dispatcher: &Dispatcher<R>,
    scope: &Scope,
    cancel: &CancellationToken,
) -> RelayResultOf<T::Response>
where
    T: Request,
    E: EventMessage,
    R: Registry,
    Fut: std::future::Future<Output = RelayResultOf<T::Response>>,
    MakeEvent: FnOnce(&T, &RelayError) -> Option<E>,
{
    match body().await {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(event) = compensate(request, &err) {
                dispatcher.publish_event(&event, scope, cancel).await;
            }
            Err(RelayError::handler_failed(err.message.clone()))
        }
    }
}

/// Wraps an inner [`RequestHandler`] with the compensation protocol (§4.7),
/// publishing through `dispatcher` on failure.
pub struct CompensatingRequestHandler<H, E, MakeEvent, R> {
    inner: H,
    compensate: MakeEvent,
    dispatcher: Arc<Dispatcher<R>>,
    _event: std::marker::PhantomData<fn() -> E>,
}

impl<H, E, MakeEvent, R> CompensatingRequestHandler<H, E, MakeEvent, R> {
    pub fn new(inner: H, compensate: MakeEvent, dispatcher: Arc<Dispatcher<R>>) -> Self {
        Self { inner, compensate, dispatcher, _event: std::marker::PhantomData }
    }
}

#[async_trait]
impl<Req, H, E, MakeEvent, R> RequestHandler<Req> for CompensatingRequestHandler<H, E, MakeEvent, R>
where
    Req: Request,
    H: RequestHandler<Req>,
    E: EventMessage,
    MakeEvent: Fn(&Req, &RelayError) -> Option<E> + Send + Sync,
    R: Registry,
{
    async fn handle(
        &self,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResultOf<Req::Response> {
        match self.inner.handle(request, scope, cancel).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(event) = (self.compensate)(request, &err) {
                    self.dispatcher.publish_event(&event, scope, cancel).await;
                }
                Err(RelayError::handler_failed(err.message.clone()))
            }
        }
    }
}

/// Wraps an inner [`CommandHandler`] with the compensation protocol (§4.7),
/// publishing through `dispatcher` on failure.
pub struct CompensatingCommandHandler<H, E, MakeEvent, R> {
    inner: H,
    compensate: MakeEvent,
    dispatcher: Arc<Dispatcher<R>>,
    _event: std::marker::PhantomData<fn() -> E>,
}

impl<H, E, MakeEvent, R> CompensatingCommandHandler<H, E, MakeEvent, R> {
    pub fn new(inner: H, compensate: MakeEvent, dispatcher: Arc<Dispatcher<R>>) -> Self {
        Self { inner, compensate, dispatcher, _event: std::marker::PhantomData }
    }
}

#[async_trait]
impl<C, H, E, MakeEvent, R> CommandHandler<C> for CompensatingCommandHandler<H, E, MakeEvent, R>
where
    C: Command,
    H: CommandHandler<C>,
    E: EventMessage,
    MakeEvent: Fn(&C, &RelayError) -> Option<E> + Send + Sync,
    R: Registry,
{
    async fn handle(&self, command: &C, scope: &Scope, cancel: &CancellationToken) -> RelayResult {
        match self.inner.handle(command, scope, cancel).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Some(event) = (self.compensate)(command, &err) {
                    self.dispatcher.publish_event(&event, scope, cancel).await;
                }
                Err(RelayError::handler_failed(err.message.clone()))
            }
        }
    }
}

#[cfg(test)]
#[path = "compensation_tests.rs"]
mod tests;
