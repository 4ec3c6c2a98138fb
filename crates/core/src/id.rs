// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integer ID newtypes shared across the mediator.

/// Define a newtype wrapper around a 63-bit positive integer ID.
///
/// Generates `new(i64)`, `value()`, `Display`, `From<i64>`, and equality
/// against a bare `i64`. Unlike string-keyed IDs, these carry no prefix —
/// the high bits already encode provenance (see `relay-engine`'s Snowflake
/// generator, §4.9 / §6 ID format).
///
/// ```ignore
/// define_int_id! {
///     /// Doc comment for the ID type.
///     pub struct MessageId;
/// }
/// ```
#[macro_export]
macro_rules! define_int_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }

        impl PartialEq<i64> for $name {
            fn eq(&self, other: &i64) -> bool {
                self.0 == *other
            }
        }
    };
}

/// A process-local opaque scope token for per-scope handler lifetimes (§4.2).
///
/// Rust has no ambient per-request context equivalent to a `.NET` `IServiceScope`,
/// so the registry contract takes this explicitly rather than threading it
/// through thread-locals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    /// A fresh scope, unique for the life of the process.
    pub fn new() -> Self {
        Self(nanoid::nanoid!(16))
    }

    /// A named scope, for callers that already have a natural scope key
    /// (e.g. an inbound HTTP request id from the host).
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
