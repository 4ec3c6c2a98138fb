use super::*;
use relay_adapters::JsonSerializer;
use relay_core::FakeClock;
use std::time::Duration;

#[test]
fn rejects_non_power_of_two_shard_count() {
    let err = IdempotencyStore::new(6, Duration::from_secs(60)).unwrap_err();
    assert_eq!(err.code, relay_core::RelayErrorCode::ValidationFailed);
}

#[test]
fn unseen_message_id_has_not_been_processed() {
    let store = IdempotencyStore::new(16, Duration::from_secs(60)).unwrap();
    assert!(!store.has_been_processed(MessageId::new(42)));
}

#[test]
fn marked_message_is_processed_and_cached() {
    let store = IdempotencyStore::new(16, Duration::from_secs(60)).unwrap();
    let serializer = JsonSerializer;
    let id = MessageId::new(42);
    store.mark_as_processed(&serializer, id, &"result".to_string(), "String").unwrap();
    assert!(store.has_been_processed(id));
    let cached: String = store.get_cached_result(&serializer, id, "String").unwrap();
    assert_eq!(cached, "result");
}

#[test]
fn cached_result_with_wrong_type_tag_misses() {
    let store = IdempotencyStore::new(16, Duration::from_secs(60)).unwrap();
    let serializer = JsonSerializer;
    let id = MessageId::new(7);
    store.mark_as_processed(&serializer, id, &5i32, "i32").unwrap();
    assert!(store.get_cached_result::<_, i32>(&serializer, id, "u64").is_none());
}

#[test]
fn mark_without_value_is_still_idempotent() {
    let store = IdempotencyStore::new(16, Duration::from_secs(60)).unwrap();
    let id = MessageId::new(9);
    store.mark_as_processed_without_value(id);
    assert!(store.has_been_processed(id));
}

#[test]
fn expired_record_is_no_longer_processed() {
    let clock = FakeClock::new();
    let store = IdempotencyStore::with_clock(16, Duration::from_millis(100), clock.clone()).unwrap();
    let id = MessageId::new(1);
    store.mark_as_processed_without_value(id);
    assert!(store.has_been_processed(id));
    clock.advance(Duration::from_millis(200));
    assert!(!store.has_been_processed(id));
}

#[test]
fn negative_message_ids_shard_consistently() {
    let store = IdempotencyStore::new(16, Duration::from_secs(60)).unwrap();
    let id = MessageId::new(-123);
    store.mark_as_processed_without_value(id);
    assert!(store.has_been_processed(id));
}
