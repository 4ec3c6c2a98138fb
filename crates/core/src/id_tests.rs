use super::*;

crate::define_int_id! {
    pub struct TestId;
}

#[test]
fn round_trips_through_i64() {
    let id = TestId::new(42);
    assert_eq!(id.value(), 42);
    assert_eq!(id, TestId::from(42));
    assert_eq!(id, 42i64);
}

#[test]
fn displays_as_bare_integer() {
    assert_eq!(TestId::new(7).to_string(), "7");
}

#[test]
fn scope_new_is_unique() {
    assert_ne!(Scope::new(), Scope::new());
}

#[test]
fn scope_named_round_trips() {
    assert_eq!(Scope::named("req-1").as_str(), "req-1");
}
