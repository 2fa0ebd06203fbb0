//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod candidate_store_error;
mod credential_repository;
mod destination_repository;
mod event_repository;
mod event_source;

pub use candidate_store_error::CandidateStoreError;
#[cfg(test)]
pub use credential_repository::MockCredentialRepository;
pub use credential_repository::{Credential, CredentialRepository};
#[cfg(test)]
pub use destination_repository::MockDestinationRepository;
pub use destination_repository::{DestinationRepository, HISTORY_PAGE_SIZE};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventSearch, MAX_SEARCH_EVENT_DURATION};
#[cfg(test)]
pub use event_source::MockEventSource;
pub use event_source::{EventSource, EventSourceError};
