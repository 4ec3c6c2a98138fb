// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful shutdown coordinator (§4.8): a single hierarchical cancellation
//! source every public operation threads through (§5).

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Owns the mediator's cancellation source. Child tokens handed out via
/// [`ShutdownCoordinator::child_token`] are cancelled transitively when
/// shutdown is requested, so per-call cancellation composes with process
/// shutdown without the caller threading two tokens around.
pub struct ShutdownCoordinator {
    source: CancellationToken,
    shutting_down: AtomicBool,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self { source: CancellationToken::new(), shutting_down: AtomicBool::new(false) }
    }

    /// The observable cancellation handle (§4.8).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.source.clone()
    }

    /// A token scoped under the shutdown source, cancelled automatically
    /// when shutdown is requested.
    pub fn child_token(&self) -> CancellationToken {
        self.source.child_token()
    }

    /// Idempotent: transitions to shutting-down and cancels the source. A
    /// second call is a no-op.
    pub fn request_shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::AcqRel) {
            tracing::info!("graceful shutdown requested");
            self.source.cancel();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Links an external lifecycle signal (e.g. a host's own shutdown
    /// token) so that its cancellation triggers this coordinator's shutdown
    /// too (§4.8). Returns a handle whose `abort()` unregisters the link —
    /// the coordinator's analogue of "disposal unregisters the subscription".
    pub fn link_external_signal(self: &std::sync::Arc<Self>, external: CancellationToken) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            external.cancelled().await;
            this.request_shutdown();
        })
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
