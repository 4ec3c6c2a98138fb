// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::message::{CorrelationId, Envelope, MessageId, MessageKind, Qos};

crate::builder! {
    pub struct EnvelopeBuilder => Envelope {
        into { type_tag: String = "" }
        set {
            message_id: MessageId = MessageId::new(0),
            kind: MessageKind = MessageKind::Request,
            qos: Qos = Qos::AtMostOnce,
        }
        option { correlation_id: CorrelationId = None }
    }
}

/// Proptest strategies for the core newtypes, used by `relay-engine` and
/// `relay-storage` to exercise the universally-quantified invariants in §8.
#[cfg(feature = "proptest")]
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_message_id() -> impl Strategy<Value = MessageId> {
        any::<i64>().prop_map(MessageId::new)
    }

    pub fn arb_stream_id() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,32}".prop_map(|s| s)
    }
}
