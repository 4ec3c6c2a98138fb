use super::*;
use std::sync::Arc;

#[test]
fn fresh_coordinator_is_not_shutting_down() {
    let coordinator = ShutdownCoordinator::new();
    assert!(!coordinator.is_shutting_down());
    assert!(!coordinator.shutdown_token().is_cancelled());
}

#[test]
fn request_shutdown_cancels_the_token() {
    let coordinator = ShutdownCoordinator::new();
    let token = coordinator.shutdown_token();
    coordinator.request_shutdown();
    assert!(coordinator.is_shutting_down());
    assert!(token.is_cancelled());
}

#[test]
fn request_shutdown_is_idempotent() {
    let coordinator = ShutdownCoordinator::new();
    coordinator.request_shutdown();
    coordinator.request_shutdown();
    assert!(coordinator.is_shutting_down());
}

#[test]
fn child_tokens_are_cancelled_transitively() {
    let coordinator = ShutdownCoordinator::new();
    let child = coordinator.child_token();
    assert!(!child.is_cancelled());
    coordinator.request_shutdown();
    assert!(child.is_cancelled());
}

#[tokio::test]
async fn external_signal_triggers_shutdown() {
    let coordinator = Arc::new(ShutdownCoordinator::new());
    let external = CancellationToken::new();
    let handle = coordinator.link_external_signal(external.clone());
    external.cancel();
    handle.await.unwrap();
    assert!(coordinator.is_shutting_down());
}
