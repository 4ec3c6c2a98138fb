// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch engine (§4.1): handler resolution, fast-path/pipelined
//! execution, circuit breaking, event fan-out, batch and stream variants.

use crate::behavior::{invoke_command_chain, invoke_request_chain, Behaviors, NoBehaviors};
use crate::circuit_breaker::CircuitBreaker;
use crate::handler_cache::HandlerCache;
use crate::limiter::ConcurrencyLimiter;
use crate::shutdown::ShutdownCoordinator;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use relay_adapters::{JsonSerializer, Registry, Serializer};
use relay_core::{
    Command, EventMessage, MessageId, RelayConfig, RelayError, RelayResult, RelayResultOf,
    Request, Scope,
};
use relay_storage::IdempotencyStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Extracts a readable message from a caught panic payload (§4.1, §7 —
/// a panicking handler is reported the same way as one returning `Err`).
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "handler panicked".to_string()
    }
}

struct IdempotencyLayer<S> {
    store: Arc<IdempotencyStore>,
    serializer: Arc<S>,
}

/// The dispatch engine (§4.1). Generic over the host's [`Registry`] and,
/// optionally, its [`Behaviors`] — a host with none uses [`NoBehaviors`] and
/// pays nothing for the pipeline machinery. `S` is the serializer the
/// idempotency store uses; [`Serializer`] has generic methods so it can't be
/// boxed as `dyn Serializer`, hence the type parameter rather than a trait
/// object.
pub struct Dispatcher<R: Registry, B: Behaviors = NoBehaviors, S: Serializer = JsonSerializer> {
    registry: R,
    behaviors: B,
    handler_cache: HandlerCache,
    breakers: parking_lot::RwLock<HashMap<TypeId, Arc<CircuitBreaker>>>,
    breaker_threshold: u32,
    breaker_cooldown: std::time::Duration,
    shared_limiter: Option<Arc<ConcurrencyLimiter>>,
    idempotency: Option<IdempotencyLayer<S>>,
    shutdown: ShutdownCoordinator,
}

impl<R: Registry> Dispatcher<R, NoBehaviors, JsonSerializer> {
    pub fn new(registry: R, config: &RelayConfig) -> RelayResultOf<Self> {
        Self::with_behaviors(registry, NoBehaviors, config)
    }
}

impl<R: Registry, B: Behaviors, S: Serializer> Dispatcher<R, B, S> {
    pub fn with_behaviors(registry: R, behaviors: B, config: &RelayConfig) -> RelayResultOf<Self> {
        let shared_limiter = match config.effective_max_event_handler_concurrency() {
            Some(max) => Some(Arc::new(ConcurrencyLimiter::new(max)?)),
            None => None,
        };
        Ok(Self {
            registry,
            behaviors,
            handler_cache: HandlerCache::new(),
            breakers: parking_lot::RwLock::new(HashMap::new()),
            breaker_threshold: config.circuit_breaker_threshold,
            breaker_cooldown: config.circuit_breaker_duration(),
            shared_limiter,
            idempotency: None,
            shutdown: ShutdownCoordinator::new(),
        })
    }

    /// Attaches an idempotency store + serializer, enabling the
    /// `*_idempotent` call variants (§4.5 integration, data-flow in §2).
    pub fn with_idempotency(mut self, store: Arc<IdempotencyStore>, serializer: Arc<S>) -> Self {
        self.idempotency = Some(IdempotencyLayer { store, serializer });
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.shutdown_token()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_shutting_down()
    }

    fn breaker_for(&self, type_id: TypeId) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(&type_id) {
            return breaker.clone();
        }
        let mut map = self.breakers.write();
        map.entry(type_id)
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(self.breaker_threshold, self.breaker_cooldown))
            })
            .clone()
    }

    fn rejected(&self, cancel: &CancellationToken) -> bool {
        self.shutdown.is_shutting_down() || cancel.is_cancelled()
    }

    /// Resolves and invokes the bound handler for `Req`, through the
    /// behavior pipeline if any are registered, wrapped by the circuit
    /// breaker (§4.1).
    pub async fn send_request<Req: Request>(
        &self,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResultOf<Req::Response> {
        if self.rejected(cancel) {
            return Err(RelayError::cancelled());
        }
        let handler = self.handler_cache.resolve_request::<Req, _>(&self.registry, scope)?;
        let breaker = self.breaker_for(TypeId::of::<Req>());
        breaker.before_call()?;

        let behaviors = self.behaviors.request_behaviors::<Req>();
        let outcome = if behaviors.is_empty() {
            AssertUnwindSafe(handler.handle(request, scope, cancel)).catch_unwind().await
        } else {
            AssertUnwindSafe(invoke_request_chain(0, &behaviors, &handler, request, scope, cancel))
                .catch_unwind()
                .await
        };
        let result = outcome.unwrap_or_else(|panic| Err(RelayError::handler_failed(panic_message(&*panic))));

        match &result {
            Ok(_) => breaker.on_success(),
            Err(_) => breaker.on_failure(),
        }
        result
    }

    /// As [`Self::send_request`], but checks the idempotency store first
    /// and caches a successful result keyed by `message_id` (§2 data flow,
    /// §4.5).
    pub async fn send_request_idempotent<Req>(
        &self,
        message_id: MessageId,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResultOf<Req::Response>
    where
        Req: Request,
        Req::Response: Serialize + DeserializeOwned + Clone,
    {
        if self.rejected(cancel) {
            return Err(RelayError::cancelled());
        }
        if let Some(layer) = &self.idempotency {
            if let Some(cached) = layer.store.get_cached_result::<_, Req::Response>(
                layer.serializer.as_ref(),
                message_id,
                Req::type_tag(),
            ) {
                return Ok(cached);
            }
        }
        let result = self.send_request(request, scope, cancel).await;
        if let (Ok(value), Some(layer)) = (&result, &self.idempotency) {
            let _ = layer.store.mark_as_processed(
                layer.serializer.as_ref(),
                message_id,
                value,
                Req::type_tag(),
            );
        }
        result
    }

    pub async fn send_command<C: Command>(
        &self,
        command: &C,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResult {
        if self.rejected(cancel) {
            return Err(RelayError::cancelled());
        }
        let handler = self.handler_cache.resolve_command::<C, _>(&self.registry, scope)?;
        let breaker = self.breaker_for(TypeId::of::<C>());
        breaker.before_call()?;

        let behaviors = self.behaviors.command_behaviors::<C>();
        let outcome = if behaviors.is_empty() {
            AssertUnwindSafe(handler.handle(command, scope, cancel)).catch_unwind().await
        } else {
            AssertUnwindSafe(invoke_command_chain(0, &behaviors, &handler, command, scope, cancel))
                .catch_unwind()
                .await
        };
        let result = outcome.unwrap_or_else(|panic| Err(RelayError::handler_failed(panic_message(&*panic))));

        match &result {
            Ok(()) => breaker.on_success(),
            Err(_) => breaker.on_failure(),
        }
        result
    }

    /// As [`Self::send_command`], with idempotency bookkeeping but no
    /// cached value (commands carry no response, §4.5 "processed without
    /// value").
    pub async fn send_command_idempotent<C: Command>(
        &self,
        message_id: MessageId,
        command: &C,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResult {
        if self.rejected(cancel) {
            return Err(RelayError::cancelled());
        }
        if let Some(layer) = &self.idempotency {
            if layer.store.has_been_processed(message_id) {
                return Ok(());
            }
        }
        let result = self.send_command(command, scope, cancel).await;
        if result.is_ok() {
            if let Some(layer) = &self.idempotency {
                layer.store.mark_as_processed_without_value(message_id);
            }
        }
        result
    }

    /// Resolves every bound handler for `E` and runs each in its own
    /// supervised task; a failing handler is logged and swallowed (§4.1).
    /// Returns only once every handler has terminated.
    pub async fn publish_event<E: EventMessage>(
        &self,
        event: &E,
        scope: &Scope,
        cancel: &CancellationToken,
    ) {
        let handlers = self.handler_cache.resolve_events::<E, _>(&self.registry, scope);
        if handlers.is_empty() {
            return;
        }
        let limiter = self.shared_limiter.clone();
        let breaker = self.breaker_for(TypeId::of::<E>());
        let mut tasks = tokio::task::JoinSet::new();
        for handler in handlers {
            let event = event.clone();
            let scope = scope.clone();
            let cancel = cancel.clone();
            let limiter = limiter.clone();
            let breaker = breaker.clone();
            tasks.spawn(async move {
                let _permit = if let Some(limiter) = &limiter {
                    match limiter.acquire(&cancel).await {
                        Ok(permit) => Some(permit),
                        Err(_) => return,
                    }
                } else {
                    None
                };
                if let Err(err) = breaker.before_call() {
                    tracing::warn!(
                        type_tag = E::type_tag(),
                        error = %err,
                        "event handler skipped; circuit open"
                    );
                    return;
                }
                match handler.handle(&event, &scope, &cancel).await {
                    Ok(()) => breaker.on_success(),
                    Err(err) => {
                        breaker.on_failure();
                        tracing::warn!(
                            type_tag = E::type_tag(),
                            error = %err,
                            "event handler failed; swallowed per publish semantics"
                        );
                    }
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(join_err) = joined {
                breaker.on_failure();
                tracing::warn!(
                    type_tag = E::type_tag(),
                    error = %join_err,
                    "event handler task panicked; swallowed per publish semantics"
                );
            }
        }
    }

    /// Publishes every event in `events`, fanning out to every bound
    /// handler for each; completes when all are done (§4.1 `publish_batch`).
    pub async fn publish_batch<E: EventMessage>(
        &self,
        events: &[E],
        scope: &Scope,
        cancel: &CancellationToken,
    ) {
        let mut futs: FuturesUnordered<_> =
            events.iter().map(|event| self.publish_event(event, scope, cancel)).collect();
        while futs.next().await.is_some() {}
    }

    async fn dispatch_one<Req: Request>(
        &self,
        index: usize,
        request: &Req,
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> (usize, RelayResultOf<Req::Response>) {
        let _permit = if let Some(limiter) = &self.shared_limiter {
            match limiter.acquire(cancel).await {
                Ok(permit) => Some(permit),
                Err(err) => return (index, Err(err)),
            }
        } else {
            None
        };
        (index, self.send_request(request, scope, cancel).await)
    }

    /// Dispatches every request concurrently (subject to the shared
    /// limiter, if configured), preserving input order in the output
    /// (§4.1 `send_batch`). An empty input returns an empty output.
    pub async fn send_batch<Req: Request>(
        &self,
        requests: &[Req],
        scope: &Scope,
        cancel: &CancellationToken,
    ) -> RelayResultOf<Vec<RelayResultOf<Req::Response>>> {
        if self.rejected(cancel) {
            return Err(RelayError::cancelled());
        }
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let mut futs: FuturesUnordered<_> = requests
            .iter()
            .enumerate()
            .map(|(i, req)| self.dispatch_one(i, req, scope, cancel))
            .collect();
        let mut collected = Vec::with_capacity(requests.len());
        while let Some(item) = futs.next().await {
            collected.push(item);
        }
        collected.sort_by_key(|(i, _)| *i);
        Ok(collected.into_iter().map(|(_, r)| r).collect())
    }

    /// Pull-driven dispatch over an input stream (§4.1 `send_stream`): one
    /// result per input, order preserved, cancellation stops further pulls
    /// while letting an already-started handler finish.
    pub fn send_stream<'a, Req, St>(
        &'a self,
        requests: St,
        scope: &'a Scope,
        cancel: &'a CancellationToken,
    ) -> impl futures_util::Stream<Item = RelayResultOf<Req::Response>> + 'a
    where
        Req: Request + 'a,
        St: futures_util::Stream<Item = Req> + 'a,
    {
        requests.then(move |request| async move {
            if self.rejected(cancel) {
                return Err(RelayError::cancelled());
            }
            self.send_request(&request, scope, cancel).await
        })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
