//! gRPC error mapping.
//!
//! Lease errors map to gRPC status codes:
//! - PoolExhausted → RESOURCE_EXHAUSTED
//! - NotRented → NOT_FOUND
//! - WorkerClosed → UNAVAILABLE

use crate::core::error::LeaseError;
use tonic::Status;

/// Convert a LeaseError to a tonic Status.
pub fn to_status(err: &LeaseError) -> Status {
    match err {
        LeaseError::PoolExhausted => Status::resource_exhausted("the ticket pool is exhausted"),
        LeaseError::NotRented { .. } => Status::not_found(err.to_string()),
        LeaseError::WorkerClosed => Status::unavailable("the lease worker is shutting down"),
        LeaseError::InvalidRequest { message } => Status::invalid_argument(message.clone()),
        LeaseError::Internal { message } => Status::internal(message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn status_codes() {
        assert_eq!(to_status(&LeaseError::PoolExhausted).code(), Code::ResourceExhausted);
        assert_eq!(
            to_status(&LeaseError::NotRented { ticket: 3 }).code(),
            Code::NotFound
        );
        assert_eq!(to_status(&LeaseError::WorkerClosed).code(), Code::Unavailable);
        assert_eq!(
            to_status(&LeaseError::invalid_request("zero ticket")).code(),
            Code::InvalidArgument
        );
        assert_eq!(
            to_status(&LeaseError::internal("boom")).code(),
            Code::Internal
        );
    }

    #[test]
    fn not_rented_names_the_ticket() {
        let status = to_status(&LeaseError::NotRented { ticket: 42 });
        assert!(status.message().contains("42"));
    }
}
