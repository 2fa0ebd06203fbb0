//! Error contract shared by the Candidate Store ports.

use super::define_port_error;
use crate::domain::{Error, ErrorKind};

define_port_error! {
    /// Errors raised by Candidate Store adapters.
    pub enum CandidateStoreError {
        /// Nothing matched the lookup.
        NotFound { message: String } => "candidate store record not found: {message}",
        /// A uniqueness constraint was violated.
        Conflict { message: String } => "candidate store conflict: {message}",
        /// The record offered for storage is unusable.
        InvalidRecord { message: String } => "candidate store rejected record: {message}",
        /// The caller abandoned the operation.
        Canceled => "candidate store operation canceled",
        /// The store is unreachable.
        Connection { message: String } => "candidate store connection failed: {message}",
        /// The store failed while executing the operation.
        Query { message: String } => "candidate store query failed: {message}",
    }
}

impl From<CandidateStoreError> for Error {
    fn from(value: CandidateStoreError) -> Self {
        let kind = match &value {
            CandidateStoreError::NotFound { .. } => ErrorKind::NotExist,
            CandidateStoreError::Conflict { .. } => ErrorKind::Exist,
            CandidateStoreError::InvalidRecord { .. } => ErrorKind::Invalid,
            CandidateStoreError::Canceled => return Self::builder().canceled().build(),
            CandidateStoreError::Connection { .. } | CandidateStoreError::Query { .. } => {
                ErrorKind::Internal
            }
        };
        Self::builder().kind(kind).cause(value.to_string()).build()
    }
}
