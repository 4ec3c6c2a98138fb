// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry contract (§6): what the core consumes from the host's DI
//! container. The core never inspects runtime types — it dispatches on the
//! type tag a `Request`/`Command`/`EventMessage` impl declares, and the
//! registry resolves a binding for that type (§9 handler polymorphism).

use crate::handler::{CommandHandler, EventHandler, RequestHandler};
use relay_core::{Command, EventMessage, HandlerLifetime, RelayError, RelayResultOf, Request};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves handler bindings for request, command, and event types (§6).
///
/// Implementations are expected to be cheap to call repeatedly — the
/// dispatch engine's handler cache (§4.2) memoizes the result per type tag
/// per the binding's [`HandlerLifetime`], so a registry need not memoize
/// itself, though nothing stops a production adapter from doing so anyway.
pub trait Registry: Send + Sync + 'static {
    /// Requests require exactly one binding (§3); no binding is a
    /// `HandlerFailed` error, not a panic.
    fn request_binding<Req: Request>(
        &self,
    ) -> RelayResultOf<(Arc<dyn RequestHandler<Req>>, HandlerLifetime)>;

    /// Commands require exactly one binding (§3).
    fn command_binding<C: Command>(
        &self,
    ) -> RelayResultOf<(Arc<dyn CommandHandler<C>>, HandlerLifetime)>;

    /// Events allow zero or more bindings (§3); an empty list is valid.
    fn event_bindings<E: EventMessage>(&self) -> Vec<(Arc<dyn EventHandler<E>>, HandlerLifetime)>;
}

type ErasedEntry = (Box<dyn Any + Send + Sync>, HandlerLifetime);

/// A small in-memory [`Registry`] suitable for tests and single-process
/// hosts, grounded on the teacher's `test-support`-gated fake adapters.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct InMemoryRegistry {
    requests: parking_lot::RwLock<HashMap<TypeId, ErasedEntry>>,
    commands: parking_lot::RwLock<HashMap<TypeId, ErasedEntry>>,
    events: parking_lot::RwLock<HashMap<TypeId, Vec<ErasedEntry>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_request<Req, H>(&self, handler: Arc<H>, lifetime: HandlerLifetime)
    where
        Req: Request,
        H: RequestHandler<Req> + 'static,
    {
        let erased: Arc<dyn RequestHandler<Req>> = handler;
        self.requests.write().insert(TypeId::of::<Req>(), (Box::new(erased), lifetime));
    }

    pub fn bind_command<C, H>(&self, handler: Arc<H>, lifetime: HandlerLifetime)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let erased: Arc<dyn CommandHandler<C>> = handler;
        self.commands.write().insert(TypeId::of::<C>(), (Box::new(erased), lifetime));
    }

    pub fn bind_event<E, H>(&self, handler: Arc<H>, lifetime: HandlerLifetime)
    where
        E: EventMessage,
        H: EventHandler<E> + 'static,
    {
        let erased: Arc<dyn EventHandler<E>> = handler;
        self.events.write().entry(TypeId::of::<E>()).or_default().push((Box::new(erased), lifetime));
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Registry for InMemoryRegistry {
    fn request_binding<Req: Request>(
        &self,
    ) -> RelayResultOf<(Arc<dyn RequestHandler<Req>>, HandlerLifetime)> {
        let map = self.requests.read();
        let (boxed, lifetime) = map
            .get(&TypeId::of::<Req>())
            .ok_or_else(|| RelayError::no_handler(Req::type_tag()))?;
        let handler = boxed
            .downcast_ref::<Arc<dyn RequestHandler<Req>>>()
            .ok_or_else(|| RelayError::internal("handler registry type mismatch"))?
            .clone();
        Ok((handler, *lifetime))
    }

    fn command_binding<C: Command>(
        &self,
    ) -> RelayResultOf<(Arc<dyn CommandHandler<C>>, HandlerLifetime)> {
        let map = self.commands.read();
        let (boxed, lifetime) = map
            .get(&TypeId::of::<C>())
            .ok_or_else(|| RelayError::no_handler(C::type_tag()))?;
        let handler = boxed
            .downcast_ref::<Arc<dyn CommandHandler<C>>>()
            .ok_or_else(|| RelayError::internal("handler registry type mismatch"))?
            .clone();
        Ok((handler, *lifetime))
    }

    fn event_bindings<E: EventMessage>(&self) -> Vec<(Arc<dyn EventHandler<E>>, HandlerLifetime)> {
        let map = self.events.read();
        let Some(entries) = map.get(&TypeId::of::<E>()) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|(boxed, lifetime)| {
                boxed.downcast_ref::<Arc<dyn EventHandler<E>>>().map(|h| (h.clone(), *lifetime))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
