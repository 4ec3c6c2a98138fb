// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler resolution cache (§4.1 resolution algorithm, §4.2). Write-once
//! per type tag (or per type tag + scope), via a double-checked
//! read-then-write-lock pattern rather than a CAS loop, since the cached
//! value is an `Arc` clone, not a primitive.

use relay_adapters::Registry;
use relay_core::{Command, EventMessage, HandlerLifetime, Request, Scope};
use relay_core::{RelayError, RelayResultOf};
use relay_adapters::{CommandHandler, EventHandler, RequestHandler};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Erased = Box<dyn Any + Send + Sync>;

/// Per-mediator handler cache (§4.2). Singleton bindings are cached once for
/// the process; scoped bindings are cached once per [`Scope`]; transient
/// bindings are re-resolved from the registry on every call.
#[derive(Default)]
pub struct HandlerCache {
    singletons: parking_lot::RwLock<HashMap<TypeId, Erased>>,
    scoped: parking_lot::RwLock<HashMap<(TypeId, Scope), Erased>>,
}

impl HandlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_request<Req, R>(
        &self,
        registry: &R,
        scope: &Scope,
    ) -> RelayResultOf<Arc<dyn RequestHandler<Req>>>
    where
        Req: Request,
        R: Registry,
    {
        let type_id = TypeId::of::<Req>();
        if let Some(cached) = self.read_cached::<Arc<dyn RequestHandler<Req>>>(type_id, scope) {
            return cached;
        }
        let (handler, lifetime) = registry.request_binding::<Req>()?;
        self.cache(type_id, scope, lifetime, handler)
    }

    pub fn resolve_command<C, R>(
        &self,
        registry: &R,
        scope: &Scope,
    ) -> RelayResultOf<Arc<dyn CommandHandler<C>>>
    where
        C: Command,
        R: Registry,
    {
        let type_id = TypeId::of::<C>();
        if let Some(cached) = self.read_cached::<Arc<dyn CommandHandler<C>>>(type_id, scope) {
            return cached;
        }
        let (handler, lifetime) = registry.command_binding::<C>()?;
        self.cache(type_id, scope, lifetime, handler)
    }

    /// Event bindings are cached as a group keyed by the first binding's
    /// lifetime; an empty binding list is never cached (there's nothing to
    /// memoize and a later registration should be observable).
    pub fn resolve_events<E, R>(
        &self,
        registry: &R,
        scope: &Scope,
    ) -> Vec<Arc<dyn EventHandler<E>>>
    where
        E: EventMessage,
        R: Registry,
    {
        let type_id = TypeId::of::<E>();
        if let Some(cached) =
            self.read_cached::<Vec<Arc<dyn EventHandler<E>>>>(type_id, scope)
        {
            if let Ok(handlers) = cached {
                return handlers;
            }
        }
        let bindings = registry.event_bindings::<E>();
        if bindings.is_empty() {
            return Vec::new();
        }
        let lifetime = bindings[0].1;
        let handlers: Vec<Arc<dyn EventHandler<E>>> =
            bindings.into_iter().map(|(h, _)| h).collect();
        self.cache(type_id, scope, lifetime, handlers.clone()).ok();
        handlers
    }

    fn read_cached<T>(&self, type_id: TypeId, scope: &Scope) -> Option<RelayResultOf<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        if let Some(boxed) = self.singletons.read().get(&type_id) {
            return Some(self.downcast::<T>(boxed));
        }
        let key = (type_id, scope.clone());
        if let Some(boxed) = self.scoped.read().get(&key) {
            return Some(self.downcast::<T>(boxed));
        }
        None
    }

    fn downcast<T: Clone + Send + Sync + 'static>(&self, boxed: &Erased) -> RelayResultOf<T> {
        boxed
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| RelayError::internal("handler cache type mismatch"))
    }

    fn cache<T>(
        &self,
        type_id: TypeId,
        scope: &Scope,
        lifetime: HandlerLifetime,
        value: T,
    ) -> RelayResultOf<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match lifetime {
            HandlerLifetime::Transient => Ok(value),
            HandlerLifetime::Singleton => {
                let mut map = self.singletons.write();
                let boxed = map.entry(type_id).or_insert_with(|| Box::new(value.clone()) as Erased);
                self.downcast::<T>(boxed)
            }
            HandlerLifetime::Scoped => {
                let key = (type_id, scope.clone());
                let mut map = self.scoped.write();
                let boxed = map.entry(key).or_insert_with(|| Box::new(value.clone()) as Erased);
                self.downcast::<T>(boxed)
            }
        }
    }
}

#[cfg(test)]
#[path = "handler_cache_tests.rs"]
mod tests;
