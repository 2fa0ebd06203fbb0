//! Driven port for the event side of the Candidate Store.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use super::CandidateStoreError;
use crate::domain::{Event, EventId, RawEvent, Region};

/// Events lasting this long or longer never appear in search results.
pub const MAX_SEARCH_EVENT_DURATION: TimeDelta = TimeDelta::hours(10);

/// Geospatial and temporal event query.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSearch {
    /// Events must lie inside this polygon.
    pub region: Region,
    /// Inclusive lower bound of the time range.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound of the time range.
    pub end: DateTime<Utc>,
    /// Whether classifier-flagged events are returned.
    pub include_bad: bool,
}

/// Port for querying and storing events.
///
/// Implementations must only return events that lie inside the region,
/// overlap `[start, end)`, last less than [`MAX_SEARCH_EVENT_DURATION`],
/// carry a street address and, unless `include_bad` is set, are not flagged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Events matching `search`, ordered by start time.
    async fn search(&self, search: &EventSearch) -> Result<Vec<Event>, CandidateStoreError>;

    /// One event; `NotFound` when unknown.
    async fn get_by_id(&self, id: &EventId) -> Result<Event, CandidateStoreError>;

    /// Known events among `ids`, ordered by start time. Unknown ids are
    /// skipped.
    async fn get_multi(&self, ids: &[EventId]) -> Result<Vec<Event>, CandidateStoreError>;

    /// Insert or replace an event from its raw body, keeping any existing
    /// bad flag.
    async fn upsert(&self, raw: &RawEvent) -> Result<Event, CandidateStoreError>;

    /// Persist the classifier verdict for an event.
    async fn set_bad(&self, id: &EventId, is_bad: bool) -> Result<(), CandidateStoreError>;
}
