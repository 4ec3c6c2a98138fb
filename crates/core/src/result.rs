// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mediator's error taxonomy and Result sum type (§3, §7).

/// Stable, wire-safe error code surface (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RelayErrorCode {
    ValidationFailed,
    HandlerFailed,
    PipelineFailed,
    PersistenceFailed,
    LockFailed,
    TransportFailed,
    SerializationFailed,
    Timeout,
    Cancelled,
    Internal,
}

crate::simple_display! {
    RelayErrorCode {
        ValidationFailed => "VALIDATION_FAILED",
        HandlerFailed => "HANDLER_FAILED",
        PipelineFailed => "PIPELINE_FAILED",
        PersistenceFailed => "PERSISTENCE_FAILED",
        LockFailed => "LOCK_FAILED",
        TransportFailed => "TRANSPORT_FAILED",
        SerializationFailed => "SERIALIZATION_FAILED",
        Timeout => "TIMEOUT",
        Cancelled => "CANCELLED",
        Internal => "INTERNAL_ERROR",
    }
}

/// The mediator's single error type. Carries an error code (§6), a
/// human-readable message, whether the caller may retry (§7 — retryable is
/// the exception, not the default), and an optional boxed cause.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RelayError {
    pub message: String,
    pub code: RelayErrorCode,
    pub retryable: bool,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RelayError {
    pub fn new(code: RelayErrorCode, message: impl Into<String>) -> Self {
        Self { message: message.into(), code, retryable: false, cause: None }
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::ValidationFailed, message)
    }

    /// A handler returned `{err}` or panicked (§4.1 failure policy).
    pub fn handler_failed(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::HandlerFailed, format!("Handler failed: {}", message.into()))
    }

    pub fn no_handler(type_tag: &str) -> Self {
        Self::new(RelayErrorCode::HandlerFailed, format!("no handler for `{type_tag}`"))
    }

    /// Circuit breaker short-circuit (§4.4); always retryable.
    pub fn circuit_open() -> Self {
        Self::new(RelayErrorCode::HandlerFailed, "circuit open").retryable()
    }

    pub fn cancelled() -> Self {
        Self::new(RelayErrorCode::Cancelled, "operation was cancelled")
    }

    pub fn timeout() -> Self {
        Self::new(RelayErrorCode::Timeout, "timed out waiting for a permit").retryable()
    }

    pub fn concurrency_conflict(stream_id: &str, expected: i64, actual: i64) -> Self {
        Self::new(
            RelayErrorCode::PersistenceFailed,
            format!(
                "concurrency conflict on stream `{stream_id}`: expected version {expected}, actual {actual}"
            ),
        )
        .retryable()
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::SerializationFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RelayErrorCode::Internal, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Mediator-wide `Result` alias for the "without value" Result shape (§3).
pub type RelayResult = std::result::Result<(), RelayError>;

/// Mediator-wide `Result` alias for the "with value" Result shape (§3).
pub type RelayResultOf<T> = std::result::Result<T, RelayError>;
