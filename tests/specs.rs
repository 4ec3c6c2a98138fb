// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six end-to-end scenarios with literal inputs (§8): one integration
//! test per scenario, exercised against the public crate surface the way a
//! host application would use it.

use async_trait::async_trait;
use relay_adapters::{CommandHandler, EventHandler, InMemoryRegistry, JsonSerializer, RequestHandler};
use relay_core::{EventMessage, HandlerLifetime, Message, MessageId, RelayConfig, RelayError, RelayResult, RelayResultOf, Request, Scope};
use relay_engine::{with_compensation, CircuitBreaker, Dispatcher};
use relay_storage::{EventStore, IdempotencyStore, ANY_VERSION};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct EchoCmd {
    id: i64,
    payload: String,
}

impl Message for EchoCmd {
    fn type_tag() -> &'static str {
        "EchoCmd"
    }
}

impl Request for EchoCmd {
    type Response = String;
}

struct UppercaseHandler(Arc<AtomicUsize>);

#[async_trait]
impl RequestHandler<EchoCmd> for UppercaseHandler {
    async fn handle(&self, request: &EchoCmd, _scope: &Scope, _cancel: &CancellationToken) -> RelayResultOf<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(request.payload.to_uppercase())
    }
}

#[tokio::test]
async fn scenario_1_idempotent_command_short_circuits_to_the_cached_result() {
    let registry = InMemoryRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    registry.bind_request::<EchoCmd, _>(Arc::new(UppercaseHandler(calls.clone())), HandlerLifetime::Singleton);

    let store = Arc::new(IdempotencyStore::new(16, Duration::from_secs(60)).unwrap());
    let dispatcher = Dispatcher::new(registry, &RelayConfig::default())
        .unwrap()
        .with_idempotency(store, Arc::new(JsonSerializer));

    let scope = Scope::new();
    let cancel = CancellationToken::new();
    let message_id = MessageId::new(42);
    let request = EchoCmd { id: 42, payload: "x".to_string() };

    let first = dispatcher.send_request_idempotent(message_id, &request, &scope, &cancel).await.unwrap();
    assert_eq!(first, "X");

    let second = dispatcher.send_request_idempotent(message_id, &request, &scope, &cancel).await.unwrap();
    assert_eq!(second, "X");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second send must not invoke the handler again");
}

#[derive(Clone)]
struct Step {
    i: i32,
    ok: bool,
}

impl Message for Step {
    fn type_tag() -> &'static str {
        "Step"
    }
}

impl Request for Step {
    type Response = i32;
}

struct StepHandler(Arc<AtomicUsize>);

#[async_trait]
impl RequestHandler<Step> for StepHandler {
    async fn handle(&self, request: &Step, _scope: &Scope, _cancel: &CancellationToken) -> RelayResultOf<i32> {
        self.0.fetch_add(1, Ordering::SeqCst);
        if request.ok {
            Ok(request.i)
        } else {
            Err(RelayError::validation(format!("step {} failed", request.i)))
        }
    }
}

#[tokio::test]
async fn scenario_2_batch_with_mixed_outcomes_preserves_order() {
    let registry = InMemoryRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    registry.bind_request::<Step, _>(Arc::new(StepHandler(calls.clone())), HandlerLifetime::Singleton);
    let dispatcher = Dispatcher::new(registry, &RelayConfig::default()).unwrap();

    let scope = Scope::new();
    let cancel = CancellationToken::new();
    let requests = vec![Step { i: 0, ok: true }, Step { i: 1, ok: false }, Step { i: 2, ok: true }];

    let results = dispatcher.send_batch(&requests, &scope, &cancel).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    assert_eq!(*results[0].as_ref().unwrap(), 0);
    assert_eq!(*results[2].as_ref().unwrap(), 2);
}

#[derive(Clone)]
struct Notified;

impl Message for Notified {
    fn type_tag() -> &'static str {
        "Notified"
    }
}

impl EventMessage for Notified {}

struct RanHandler {
    ran: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl EventHandler<Notified> for RanHandler {
    async fn handle(&self, _event: &Notified, _scope: &Scope, _cancel: &CancellationToken) -> RelayResult {
        self.ran.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RelayError::handler_failed("H2 exploded"))
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn scenario_3_event_fan_out_survives_a_failing_handler() {
    let registry = InMemoryRegistry::new();
    let h1 = Arc::new(AtomicUsize::new(0));
    let h2 = Arc::new(AtomicUsize::new(0));
    let h3 = Arc::new(AtomicUsize::new(0));
    registry.bind_event::<Notified, _>(Arc::new(RanHandler { ran: h1.clone(), fail: false }), HandlerLifetime::Singleton);
    registry.bind_event::<Notified, _>(Arc::new(RanHandler { ran: h2.clone(), fail: true }), HandlerLifetime::Singleton);
    registry.bind_event::<Notified, _>(Arc::new(RanHandler { ran: h3.clone(), fail: false }), HandlerLifetime::Singleton);
    let dispatcher = Dispatcher::new(registry, &RelayConfig::default()).unwrap();

    let scope = Scope::new();
    let cancel = CancellationToken::new();
    dispatcher.publish_event(&Notified, &scope, &cancel).await;

    assert_eq!(h1.load(Ordering::SeqCst), 1);
    assert_eq!(h2.load(Ordering::SeqCst), 1);
    assert_eq!(h3.load(Ordering::SeqCst), 1);
}

#[derive(Debug, Clone)]
struct Deposited(i64);

#[tokio::test]
async fn scenario_4_event_store_concurrency_100_appends_land_with_contiguous_versions() {
    let store = Arc::new(EventStore::<Deposited>::new());
    let mut tasks = Vec::new();
    for i in 0..100i64 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.append("account-1", vec![Deposited(i)], ANY_VERSION).unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let (events, version) = store.read("account-1", 0, None);
    assert_eq!(events.len(), 100);
    assert_eq!(version, 99);
    let mut versions: Vec<i64> = events.iter().map(|e| e.version).collect();
    versions.sort_unstable();
    assert_eq!(versions, (0..100).collect::<Vec<_>>());
}

#[tokio::test]
async fn scenario_5_circuit_breaker_opens_then_recovers_through_a_half_open_probe() {
    use relay_core::FakeClock;

    let clock = FakeClock::new();
    let breaker = CircuitBreaker::with_clock(3, Duration::from_millis(1_000), clock.clone());

    for _ in 0..3 {
        breaker.before_call().unwrap();
        breaker.on_failure();
    }

    let err = breaker.before_call().unwrap_err();
    assert!(err.is_retryable());

    clock.advance(Duration::from_millis(1_001));
    breaker.before_call().unwrap();
    breaker.on_success();
    assert_eq!(breaker.state(), relay_engine::BreakerState::Closed);

    for _ in 0..3 {
        breaker.before_call().unwrap();
        breaker.on_failure();
    }
    assert_eq!(breaker.state(), relay_engine::BreakerState::Open);
}

#[derive(Clone)]
struct CreateOrderCmd;

impl Message for CreateOrderCmd {
    fn type_tag() -> &'static str {
        "CreateOrderCmd"
    }
}

impl Request for CreateOrderCmd {
    type Response = ();
}

#[derive(Clone)]
struct OrderRejectedEvt {
    reason: String,
}

impl Message for OrderRejectedEvt {
    fn type_tag() -> &'static str {
        "OrderRejectedEvt"
    }
}

impl EventMessage for OrderRejectedEvt {}

struct OutOfStockHandler;

#[async_trait]
impl RequestHandler<CreateOrderCmd> for OutOfStockHandler {
    async fn handle(&self, _request: &CreateOrderCmd, _scope: &Scope, _cancel: &CancellationToken) -> RelayResultOf<()> {
        Err(RelayError::validation("out of stock"))
    }
}

struct RejectionRecorder(Arc<std::sync::Mutex<Vec<String>>>);

#[async_trait]
impl EventHandler<OrderRejectedEvt> for RejectionRecorder {
    async fn handle(&self, event: &OrderRejectedEvt, _scope: &Scope, _cancel: &CancellationToken) -> RelayResult {
        self.0.lock().unwrap().push(event.reason.clone());
        Ok(())
    }
}

#[tokio::test]
async fn scenario_6_compensation_publishes_exactly_once_and_returns_the_wrapped_error() {
    let registry = InMemoryRegistry::new();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    registry.bind_event::<OrderRejectedEvt, _>(Arc::new(RejectionRecorder(seen.clone())), HandlerLifetime::Singleton);
    let dispatcher = Dispatcher::new(registry, &RelayConfig::default()).unwrap();

    let scope = Scope::new();
    let cancel = CancellationToken::new();

    let result: RelayResultOf<()> = with_compensation(
        &CreateOrderCmd,
        || async { OutOfStockHandler.handle(&CreateOrderCmd, &scope, &cancel).await },
        |_req, err| Some(OrderRejectedEvt { reason: err.message.clone() }),
        &dispatcher,
        &scope,
        &cancel,
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.message, "Handler failed: out of stock");
    assert_eq!(&*seen.lock().unwrap(), &["out of stock".to_string()]);
}
