//! Attempt-local outcomes for one ingestion attempt.
//!
//! The split keeps retry decisions explicit inside the submission loop
//! without leaking attempt-control details into the public API.

use crate::domain::Error;

pub(super) enum AttemptError {
    /// Another attempt may succeed.
    Retryable(Error),
    /// The submission must stop.
    Fatal(Error),
}
