//! In-process candidate store.
//!
//! Implements the event, destination and credential ports over a single
//! mutex-guarded state. Used by the ingestion binary and the integration
//! tests; a durable database adapter would implement the same ports.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use rand::seq::SliceRandom;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    CandidateStoreError, Credential, CredentialRepository, DestinationRepository,
    EventRepository, EventSearch, HISTORY_PAGE_SIZE, MAX_SEARCH_EVENT_DURATION,
};
use crate::domain::{
    AccessToken, Destination, DestinationId, DestinationUpdate, Event, EventId, NewDestination,
    RawEvent, User, UserId,
};

struct StoredEvent {
    raw: RawEvent,
    event: Event,
}

#[derive(Default)]
struct StoreState {
    events: HashMap<EventId, StoredEvent>,
    // Insertion order; the newest record is last.
    destinations: Vec<Destination>,
    users: HashMap<UserId, User>,
}

/// Candidate store kept in memory for the lifetime of the process.
pub struct InMemoryCandidateStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCandidateStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// Insert or replace a user record.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateStoreError::Connection`] when the state lock is
    /// poisoned.
    pub fn insert_user(&self, user: User) -> Result<(), CandidateStoreError> {
        self.lock()?.users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Look a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateStoreError::NotFound`] for unknown users.
    pub fn user(&self, id: &UserId) -> Result<User, CandidateStoreError> {
        self.lock()?
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| CandidateStoreError::not_found(format!("user {id}")))
    }

    /// Raw body stored for an event.
    ///
    /// # Errors
    ///
    /// Returns [`CandidateStoreError::NotFound`] for unknown events.
    pub fn raw_event(&self, id: &EventId) -> Result<RawEvent, CandidateStoreError> {
        self.lock()?
            .events
            .get(id)
            .map(|stored| stored.raw.clone())
            .ok_or_else(|| CandidateStoreError::not_found(format!("event {id}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CandidateStoreError> {
        self.state
            .lock()
            .map_err(|_| CandidateStoreError::connection("candidate store lock poisoned"))
    }
}

fn matches_search(event: &Event, search: &EventSearch) -> bool {
    event
        .coordinates()
        .is_some_and(|point| search.region.contains(point))
        && event.has_address()
        && event.duration() < MAX_SEARCH_EVENT_DURATION
        && event.overlaps(search.start, search.end)
        && (search.include_bad || !event.is_bad)
}

#[async_trait]
impl EventRepository for InMemoryCandidateStore {
    async fn search(&self, search: &EventSearch) -> Result<Vec<Event>, CandidateStoreError> {
        let state = self.lock()?;
        let mut found: Vec<Event> = state
            .events
            .values()
            .map(|stored| &stored.event)
            .filter(|event| matches_search(event, search))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn get_by_id(&self, id: &EventId) -> Result<Event, CandidateStoreError> {
        self.lock()?
            .events
            .get(id)
            .map(|stored| stored.event.clone())
            .ok_or_else(|| CandidateStoreError::not_found(format!("event {id}")))
    }

    async fn get_multi(&self, ids: &[EventId]) -> Result<Vec<Event>, CandidateStoreError> {
        let state = self.lock()?;
        let mut found: Vec<Event> = ids
            .iter()
            .filter_map(|id| state.events.get(id))
            .map(|stored| stored.event.clone())
            .collect();
        found.sort_by_key(|event| event.start_time);
        Ok(found)
    }

    async fn upsert(&self, raw: &RawEvent) -> Result<Event, CandidateStoreError> {
        let mut event = raw
            .decode()
            .map_err(|err| CandidateStoreError::invalid_record(err.to_string()))?;
        let mut state = self.lock()?;
        if let Some(previous) = state.events.get(&event.id) {
            event.is_bad = previous.event.is_bad;
        }
        debug!(event_id = %event.id, "upserting event");
        state.events.insert(
            event.id.clone(),
            StoredEvent {
                raw: raw.clone(),
                event: event.clone(),
            },
        );
        Ok(event)
    }

    async fn set_bad(&self, id: &EventId, is_bad: bool) -> Result<(), CandidateStoreError> {
        let mut state = self.lock()?;
        let stored = state
            .events
            .get_mut(id)
            .ok_or_else(|| CandidateStoreError::not_found(format!("event {id}")))?;
        stored.event.is_bad = is_bad;
        Ok(())
    }
}

#[async_trait]
impl DestinationRepository for InMemoryCandidateStore {
    async fn create(&self, request: &NewDestination) -> Result<Destination, CandidateStoreError> {
        let id = DestinationId::new(Uuid::new_v4().to_string());
        let destination = Destination::new(id, request.clone(), self.clock.utc());
        self.lock()?.destinations.push(destination.clone());
        Ok(destination)
    }

    async fn get(&self, id: &DestinationId) -> Result<Destination, CandidateStoreError> {
        self.lock()?
            .destinations
            .iter()
            .find(|destination| destination.id() == id)
            .cloned()
            .ok_or_else(|| CandidateStoreError::not_found(format!("destination {id}")))
    }

    async fn update(
        &self,
        id: &DestinationId,
        update: &DestinationUpdate,
    ) -> Result<Destination, CandidateStoreError> {
        let mut state = self.lock()?;
        let destination = state
            .destinations
            .iter_mut()
            .find(|destination| destination.id() == id)
            .ok_or_else(|| CandidateStoreError::not_found(format!("destination {id}")))?;
        destination.apply(update);
        Ok(destination.clone())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        page: usize,
    ) -> Result<Vec<Destination>, CandidateStoreError> {
        let state = self.lock()?;
        Ok(state
            .destinations
            .iter()
            .rev()
            .filter(|destination| destination.user_id() == user_id)
            .skip(page.saturating_mul(HISTORY_PAGE_SIZE))
            .take(HISTORY_PAGE_SIZE)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCandidateStore {
    async fn random_credential(&self) -> Result<Credential, CandidateStoreError> {
        let state = self.lock()?;
        let holders: Vec<&User> = state
            .users
            .values()
            .filter(|user| user.has_credential())
            .collect();
        holders
            .choose(&mut rand::thread_rng())
            .map(|user| Credential {
                owner: user.id.clone(),
                token: user.token.clone(),
            })
            .ok_or_else(|| CandidateStoreError::not_found("no user holds a credential"))
    }

    async fn clear_credential(&self, owner: &UserId) -> Result<(), CandidateStoreError> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(owner)
            .ok_or_else(|| CandidateStoreError::not_found(format!("user {owner}")))?;
        user.token = AccessToken::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests;
