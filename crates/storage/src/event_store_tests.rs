use super::*;
use proptest::prelude::*;
use relay_core::test_support::strategies::arb_stream_id;

#[derive(Debug, Clone, PartialEq)]
struct Deposited(i64);

proptest! {
    /// ∀ stream s, ∀ append sequence A1..An with expected_version = ANY_VERSION:
    /// read(s).events.count = sum(|Ai|) and versions are contiguous from 0 (§4.6).
    #[test]
    fn appends_land_with_contiguous_versions(
        stream_id in arb_stream_id(),
        batch_sizes in proptest::collection::vec(1usize..5, 1..8),
    ) {
        let store: EventStore<Deposited> = EventStore::new();
        let mut expected_head = -1i64;
        for size in &batch_sizes {
            let events: Vec<Deposited> = (0..*size as i64).map(Deposited).collect();
            let head = store.append(&stream_id, events, ANY_VERSION).unwrap();
            expected_head += *size as i64;
            prop_assert_eq!(head, expected_head);
        }
        let total: usize = batch_sizes.iter().sum();
        let (events, version) = store.read(&stream_id, 0, None);
        prop_assert_eq!(events.len(), total);
        prop_assert_eq!(version, expected_head);
        for (i, stored) in events.iter().enumerate() {
            prop_assert_eq!(stored.version, i as i64);
        }
    }
}

#[test]
fn fresh_stream_has_no_version() {
    let store: EventStore<Deposited> = EventStore::new();
    assert_eq!(store.version("acct-1"), -1);
}

#[test]
fn append_assigns_contiguous_versions() {
    let store: EventStore<Deposited> = EventStore::new();
    let head = store.append("acct-1", vec![Deposited(10), Deposited(20)], ANY_VERSION).unwrap();
    assert_eq!(head, 1);
    assert_eq!(store.version("acct-1"), 1);
    let (events, version) = store.read("acct-1", 0, None);
    assert_eq!(version, 1);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].version, 0);
    assert_eq!(events[1].version, 1);
}

#[test]
fn append_rejects_empty_event_batch() {
    let store: EventStore<Deposited> = EventStore::new();
    let err = store.append("acct-1", Vec::new(), ANY_VERSION).unwrap_err();
    assert_eq!(err.code, relay_core::RelayErrorCode::ValidationFailed);
}

#[test]
fn append_enforces_expected_version() {
    let store: EventStore<Deposited> = EventStore::new();
    store.append("acct-1", vec![Deposited(1)], ANY_VERSION).unwrap();
    let err = store.append("acct-1", vec![Deposited(2)], 5).unwrap_err();
    assert_eq!(err.code, relay_core::RelayErrorCode::PersistenceFailed);
    assert!(err.is_retryable());
}

#[test]
fn any_version_skips_the_concurrency_check() {
    let store: EventStore<Deposited> = EventStore::new();
    store.append("acct-1", vec![Deposited(1)], ANY_VERSION).unwrap();
    let head = store.append("acct-1", vec![Deposited(2)], ANY_VERSION).unwrap();
    assert_eq!(head, 1);
}

#[test]
fn read_from_missing_stream_is_empty() {
    let store: EventStore<Deposited> = EventStore::new();
    let (events, version) = store.read("ghost", 0, None);
    assert!(events.is_empty());
    assert_eq!(version, -1);
}

#[test]
fn read_respects_from_version_and_max_count() {
    let store: EventStore<Deposited> = EventStore::new();
    store
        .append("acct-1", vec![Deposited(1), Deposited(2), Deposited(3)], ANY_VERSION)
        .unwrap();
    let (events, _) = store.read("acct-1", 1, Some(1));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, Deposited(2));
}

#[test]
fn read_to_version_excludes_later_events() {
    let store: EventStore<Deposited> = EventStore::new();
    store
        .append("acct-1", vec![Deposited(1), Deposited(2), Deposited(3)], ANY_VERSION)
        .unwrap();
    let events = store.read_to_version("acct-1", 1);
    assert_eq!(events.len(), 2);
}

#[test]
fn stream_ids_lists_every_stream_that_has_been_appended_to() {
    let store: EventStore<Deposited> = EventStore::new();
    store.append("a", vec![Deposited(1)], ANY_VERSION).unwrap();
    store.append("b", vec![Deposited(1)], ANY_VERSION).unwrap();
    let mut ids = store.stream_ids();
    ids.sort();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn concurrent_appends_to_distinct_streams_do_not_lose_events() {
    use std::sync::Arc;
    use std::thread;

    let store = Arc::new(EventStore::<Deposited>::new());
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(thread::spawn(move || {
            for n in 0..25 {
                store
                    .append(&format!("stream-{i}"), vec![Deposited(n)], ANY_VERSION)
                    .unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    for i in 0..8 {
        assert_eq!(store.version(&format!("stream-{i}")), 24);
    }
}
