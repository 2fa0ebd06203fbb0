//! Mapping helpers turning port failures into domain errors.

use crate::domain::ports::{CandidateStoreError, EventSourceError};
use crate::domain::{Error, ErrorKind, Op, UserId};

const ACQUIRE_CREDENTIAL: Op = Op::new("IngestionService.acquire_credential");
const CLEAR_CREDENTIAL: Op = Op::new("IngestionService.clear_credential");
const FETCH_BATCH: Op = Op::new("IngestionService.fetch_batch");
const SAVE_EVENT: Op = Op::new("IngestionService.save_event");
const MARK_EVENT: Op = Op::new("IngestionService.mark_event");

pub(super) fn map_credential_error(error: CandidateStoreError) -> Error {
    internal(ACQUIRE_CREDENTIAL, error)
}

pub(super) fn map_clear_credential_error(owner: &UserId, error: CandidateStoreError) -> Error {
    Error::at(CLEAR_CREDENTIAL)
        .kind(ErrorKind::Internal)
        .user(owner)
        .cause(Error::from(error))
        .build()
}

pub(super) fn map_expired_credential(owner: &UserId, message: &str) -> Error {
    Error::at(FETCH_BATCH)
        .kind(ErrorKind::Internal)
        .cause(format!("credential of user {owner} expired: {message}"))
        .build()
}

pub(super) fn map_source_error(error: &EventSourceError) -> Error {
    Error::at(FETCH_BATCH)
        .kind(ErrorKind::Internal)
        .cause(format!("{} [{}]", error, error.kind_name()))
        .build()
}

pub(super) fn map_save_error(error: CandidateStoreError) -> Error {
    internal(SAVE_EVENT, error)
}

pub(super) fn map_mark_error(error: CandidateStoreError) -> Error {
    internal(MARK_EVENT, error)
}

fn internal(op: Op, error: CandidateStoreError) -> Error {
    let cause = Error::from(error);
    if cause.is_canceled() {
        return Error::at(op).cause(cause).build();
    }
    Error::at(op).kind(ErrorKind::Internal).cause(cause).build()
}
