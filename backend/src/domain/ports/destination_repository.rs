//! Driven port for per-user destination history.

use async_trait::async_trait;

use super::CandidateStoreError;
use crate::domain::{Destination, DestinationId, DestinationUpdate, NewDestination, UserId};

/// Destinations returned per history page.
pub const HISTORY_PAGE_SIZE: usize = 10;

/// Port for recording and reading destinations.
///
/// Returned destinations never carry a side-loaded event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationRepository: Send + Sync {
    /// Store a destination, assigning its id and creation time.
    async fn create(&self, request: &NewDestination) -> Result<Destination, CandidateStoreError>;

    /// One destination; `NotFound` when unknown.
    async fn get(&self, id: &DestinationId) -> Result<Destination, CandidateStoreError>;

    /// Apply `update` and return the stored result; `NotFound` when unknown.
    async fn update(
        &self,
        id: &DestinationId,
        update: &DestinationUpdate,
    ) -> Result<Destination, CandidateStoreError>;

    /// Page `page` (zero-based) of the user's history, newest first,
    /// [`HISTORY_PAGE_SIZE`] per page.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: usize,
    ) -> Result<Vec<Destination>, CandidateStoreError>;
}
