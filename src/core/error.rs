//! Error types and mapping.
//!
//! Tessera defines the common lease error conditions once; protocol
//! adapters map them to their wire representation (the gRPC adapter maps
//! them to tonic status codes in `adapters::grpc::errors`).
//!
//! None of these errors is fatal to the worker: every lease-logic failure
//! is a value-level result answered synchronously to the caller. The only
//! fatal startup condition is a failed listener bind, which is handled in
//! the runtime with `anyhow`.

use thiserror::Error;

/// Common lease error conditions.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// No ticket available to rent: the free pool stayed empty after an
    /// allocation pass. Callers recover by retrying with backoff.
    #[error("ticket pool exhausted")]
    PoolExhausted,

    /// Relet targeted a ticket that is unknown or already frozen.
    /// Callers recover by renting a fresh ticket.
    #[error("ticket {ticket} is not rented")]
    NotRented { ticket: u32 },

    /// The lease worker has shut down; the request was not processed.
    #[error("lease worker is closed")]
    WorkerClosed,

    /// Malformed request (for example a zero ticket value on the wire).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl LeaseError {
    /// Create an InvalidRequest error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error indicates the operation should be retried.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::WorkerClosed)
    }
}

/// Result type using LeaseError.
pub type LeaseResult<T> = Result<T, LeaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification() {
        assert!(LeaseError::PoolExhausted.is_retriable());
        assert!(LeaseError::WorkerClosed.is_retriable());
        assert!(!LeaseError::NotRented { ticket: 7 }.is_retriable());
        assert!(!LeaseError::invalid_request("bad").is_retriable());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            LeaseError::NotRented { ticket: 42 }.to_string(),
            "ticket 42 is not rented"
        );
        assert_eq!(
            LeaseError::PoolExhausted.to_string(),
            "ticket pool exhausted"
        );
    }
}
