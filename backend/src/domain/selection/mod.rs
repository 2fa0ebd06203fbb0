//! Destination selection: choose the next event for a user and manage the
//! resulting history.
//!
//! Selection searches an expanding sequence of time windows around the
//! caller's location, skipping events the caller has already been sent and
//! events that end too soon to be reached, then picks uniformly at random
//! among whatever survives in the first non-empty window.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CandidateStoreError, DestinationRepository, EventRepository, EventSearch, HISTORY_PAGE_SIZE,
};
use crate::domain::{
    Coordinates, Destination, DestinationId, DestinationUpdate, Error, ErrorKind, Event, EventId,
    GenerateReply, GenerateResult, NewDestination, Op, Region, RequestContext, RequestedUser,
    UserId,
};

const GENERATE_NEXT: Op = Op::new("DestinationService.generate_next");
const NEXT_EVENT: Op = Op::new("DestinationService.next_event");
const LIST_HISTORY: Op = Op::new("DestinationService.list_history");
const GET_DESTINATION: Op = Op::new("DestinationService.get_destination");
const UPDATE_DESTINATION: Op = Op::new("DestinationService.update_destination");

/// Search parameters for next-destination selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Radius of the circular search region in metres.
    pub radius_m: f64,
    /// Offset from now at which the first search window opens.
    pub lead_time: TimeDelta,
    /// Length of each search window.
    pub window: TimeDelta,
    /// Assumed travel time; candidates must end after `now + travel_time`.
    pub travel_time: TimeDelta,
    /// Searching stops once a window would open further than this from now.
    pub horizon: TimeDelta,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            radius_m: 8000.0,
            lead_time: TimeDelta::minutes(10),
            window: TimeDelta::minutes(90),
            travel_time: TimeDelta::minutes(30),
            horizon: TimeDelta::hours(48),
        }
    }
}

/// Next-destination request.
///
/// The location arrives unvalidated; [`DestinationService::generate_next`]
/// rejects non-finite or out-of-range points with `Invalid`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Whose history to extend.
    pub user: RequestedUser,
    /// Caller latitude in degrees.
    pub latitude: f64,
    /// Caller longitude in degrees.
    pub longitude: f64,
}

impl GenerateRequest {
    /// Request from an already validated point.
    pub fn new(user: RequestedUser, location: Coordinates) -> Self {
        Self {
            user,
            latitude: location.latitude(),
            longitude: location.longitude(),
        }
    }
}

enum SearchOutcome {
    Chosen(Event),
    NoResults,
}

/// Domain service for choosing and managing destinations.
#[derive(Clone)]
pub struct DestinationService<E, D> {
    events: Arc<E>,
    destinations: Arc<D>,
    clock: Arc<dyn Clock>,
    config: SelectionConfig,
}

impl<E, D> DestinationService<E, D> {
    /// Build a service with default search parameters.
    pub fn new(events: Arc<E>, destinations: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(events, destinations, clock, SelectionConfig::default())
    }

    pub fn with_config(
        events: Arc<E>,
        destinations: Arc<D>,
        clock: Arc<dyn Clock>,
        config: SelectionConfig,
    ) -> Self {
        Self {
            events,
            destinations,
            clock,
            config,
        }
    }
}

impl<E, D> DestinationService<E, D>
where
    E: EventRepository,
    D: DestinationRepository,
{
    /// Choose the next destination for the requested user.
    ///
    /// Returns [`GenerateResult::Wait`] while the most recent destination has
    /// not started and [`GenerateResult::NoResults`] when nothing feasible
    /// exists within the horizon. A non-finite or out-of-range location is
    /// `Invalid`. Store failures surface as `Internal`
    /// errors; cancellation surfaces as a cancellation.
    pub async fn generate_next(
        &self,
        ctx: &RequestContext,
        request: GenerateRequest,
    ) -> Result<GenerateReply, Error> {
        let actor = ctx.actor();
        let Some(actor_id) = actor.id() else {
            return Err(Error::at(GENERATE_NEXT).kind(ErrorKind::Permission).build());
        };
        let user_id = request.user.resolve(actor_id);
        if &user_id != actor_id && !actor.is_admin() {
            return Err(Error::at(GENERATE_NEXT)
                .kind(ErrorKind::Permission)
                .user(actor_id)
                .cause(format!("cannot generate destinations for user {user_id}"))
                .build());
        }
        let location = Coordinates::new(request.latitude, request.longitude).map_err(|err| {
            Error::at(GENERATE_NEXT)
                .kind(ErrorKind::Invalid)
                .user(&user_id)
                .cause(err.to_string())
                .build()
        })?;

        let now = self.clock.utc();
        let recent = self
            .destinations
            .list_for_user(&user_id, 0)
            .await
            .map_err(|err| failure(GENERATE_NEXT, &user_id, err.into()))?;

        if self.latest_is_pending(&recent, now).await? {
            info!(user_id = %user_id, "latest destination has not started; asking caller to wait");
            let history = self
                .side_load(recent)
                .await
                .map_err(|err| failure(GENERATE_NEXT, &user_id, err))?;
            return Ok(GenerateReply {
                result: GenerateResult::Wait,
                destination: None,
                history,
            });
        }

        let seen = self
            .seen_events(&user_id, recent)
            .await
            .map_err(|err| failure(GENERATE_NEXT, &user_id, err))?;
        let outcome = self
            .next_event(ctx, location, &seen, now)
            .await
            .map_err(|err| failure(GENERATE_NEXT, &user_id, err))?;

        let chosen = match outcome {
            SearchOutcome::Chosen(event) => event,
            SearchOutcome::NoResults => {
                info!(user_id = %user_id, "no feasible destination within horizon");
                let history = self
                    .load_history(&user_id, 0)
                    .await
                    .map_err(|err| failure(GENERATE_NEXT, &user_id, err))?;
                return Ok(GenerateReply {
                    result: GenerateResult::NoResults,
                    destination: None,
                    history,
                });
            }
        };

        let created = self
            .destinations
            .create(&NewDestination {
                user_id: user_id.clone(),
                event_id: chosen.id.clone(),
            })
            .await
            .map_err(|err| failure(GENERATE_NEXT, &user_id, err.into()))?;
        info!(
            user_id = %user_id,
            destination_id = %created.id(),
            event_id = %chosen.id,
            "destination selected"
        );

        let history = self
            .load_history(&user_id, 0)
            .await
            .map_err(|err| failure(GENERATE_NEXT, &user_id, err))?;
        Ok(GenerateReply {
            result: GenerateResult::Ok,
            destination: Some(created.with_event(Some(chosen))),
            history,
        })
    }

    /// The caller's history page, newest first, with events side-loaded.
    pub async fn list_history(
        &self,
        ctx: &RequestContext,
        page: usize,
    ) -> Result<Vec<Destination>, Error> {
        let Some(user_id) = ctx.actor().id() else {
            return Err(Error::at(LIST_HISTORY).kind(ErrorKind::NotLoggedIn).build());
        };
        self.load_history(user_id, page).await.map_err(|err| {
            Error::at(LIST_HISTORY)
                .user(user_id)
                .cause(err)
                .build()
        })
    }

    /// One destination, visible to its owner and to admins.
    pub async fn get_destination(
        &self,
        ctx: &RequestContext,
        id: &DestinationId,
    ) -> Result<Destination, Error> {
        let destination = self.owned_destination(ctx, GET_DESTINATION, id).await?;
        match self.events.get_by_id(destination.event_id()).await {
            Ok(event) => Ok(destination.with_event(Some(event))),
            Err(err) => {
                warn!(
                    destination_id = %id,
                    event_id = %destination.event_id(),
                    error = %err,
                    "destination event unavailable"
                );
                Ok(destination)
            }
        }
    }

    /// Change the status and/or feedback of a destination.
    pub async fn update_destination(
        &self,
        ctx: &RequestContext,
        id: &DestinationId,
        update: &DestinationUpdate,
    ) -> Result<Destination, Error> {
        if update.is_empty() {
            return Err(Error::at(UPDATE_DESTINATION)
                .kind(ErrorKind::Invalid)
                .maybe_user(ctx.actor().id())
                .cause("update names no fields")
                .build());
        }
        self.owned_destination(ctx, UPDATE_DESTINATION, id).await?;
        let updated = self
            .destinations
            .update(id, update)
            .await
            .map_err(|err| {
                Error::at(UPDATE_DESTINATION)
                    .maybe_user(ctx.actor().id())
                    .cause(Error::from(err))
                    .build()
            })?;
        info!(destination_id = %id, "destination updated");
        Ok(updated)
    }

    async fn owned_destination(
        &self,
        ctx: &RequestContext,
        op: Op,
        id: &DestinationId,
    ) -> Result<Destination, Error> {
        let actor = ctx.actor();
        let destination = self.destinations.get(id).await.map_err(|err| {
            Error::at(op)
                .maybe_user(actor.id())
                .cause(Error::from(err))
                .build()
        })?;
        if !actor.can_access(destination.user_id()) {
            return Err(Error::at(op)
                .kind(ErrorKind::Permission)
                .maybe_user(actor.id())
                .cause(format!("destination {id} belongs to another user"))
                .build());
        }
        Ok(destination)
    }

    async fn latest_is_pending(
        &self,
        recent: &[Destination],
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let Some(latest) = recent.first() else {
            return Ok(false);
        };
        match self.events.get_by_id(latest.event_id()).await {
            Ok(event) => Ok(event.start_time > now),
            Err(CandidateStoreError::NotFound { .. }) => Ok(false),
            Err(err) => Err(failure(GENERATE_NEXT, latest.user_id(), err.into())),
        }
    }

    /// Event ids across the user's whole history.
    async fn seen_events(
        &self,
        user_id: &UserId,
        first_page: Vec<Destination>,
    ) -> Result<HashSet<EventId>, Error> {
        let mut seen: HashSet<EventId> = HashSet::new();
        let mut page = 0;
        let mut batch = first_page;
        loop {
            let full = batch.len() == HISTORY_PAGE_SIZE;
            seen.extend(batch.into_iter().map(|d| d.event_id().clone()));
            if !full {
                return Ok(seen);
            }
            page += 1;
            batch = self
                .destinations
                .list_for_user(user_id, page)
                .await
                .map_err(Error::from)?;
        }
    }

    async fn next_event(
        &self,
        ctx: &RequestContext,
        location: Coordinates,
        seen: &HashSet<EventId>,
        now: DateTime<Utc>,
    ) -> Result<SearchOutcome, Error> {
        let region = Region::circle(location, self.config.radius_m);
        let arrival = now + self.config.travel_time;
        let mut search_start = now + self.config.lead_time;

        loop {
            if search_start - now > self.config.horizon {
                return Ok(SearchOutcome::NoResults);
            }
            if ctx.is_canceled() {
                return Err(Error::canceled(NEXT_EVENT));
            }

            let search = EventSearch {
                region: region.clone(),
                start: search_start,
                end: search_start + self.config.window,
                include_bad: false,
            };
            let found = match self.events.search(&search).await {
                Ok(found) => found,
                Err(CandidateStoreError::NotFound { .. }) => return Ok(SearchOutcome::NoResults),
                Err(err) => {
                    return Err(Error::at(NEXT_EVENT).cause(Error::from(err)).build());
                }
            };
            let found_count = found.len();
            let candidates: Vec<Event> = found
                .into_iter()
                .filter(|event| !seen.contains(&event.id) && event.end_time > arrival)
                .collect();
            debug!(
                window_start = %search.start,
                window_end = %search.end,
                found = found_count,
                candidates = candidates.len(),
                "searched destination window"
            );

            if let Some(event) = pick_uniform(candidates) {
                return Ok(SearchOutcome::Chosen(event));
            }
            search_start += self.config.window;
        }
    }

    async fn load_history(&self, user_id: &UserId, page: usize) -> Result<Vec<Destination>, Error> {
        let destinations = self
            .destinations
            .list_for_user(user_id, page)
            .await
            .map_err(Error::from)?;
        self.side_load(destinations).await
    }

    async fn side_load(&self, destinations: Vec<Destination>) -> Result<Vec<Destination>, Error> {
        if destinations.is_empty() {
            return Ok(destinations);
        }
        let ids: Vec<EventId> = destinations
            .iter()
            .map(|destination| destination.event_id().clone())
            .collect();
        let events = self.events.get_multi(&ids).await.map_err(Error::from)?;
        Ok(destinations
            .into_iter()
            .map(|destination| {
                let event = events
                    .iter()
                    .find(|event| &event.id == destination.event_id())
                    .cloned();
                destination.with_event(event)
            })
            .collect())
    }
}

fn pick_uniform(candidates: Vec<Event>) -> Option<Event> {
    let mut rng = rand::thread_rng();
    candidates.choose(&mut rng).cloned()
}

/// Wrap a selection failure: `Internal` unless it is a cancellation.
fn failure(op: Op, user_id: &UserId, cause: Error) -> Error {
    let builder = Error::at(op).user(user_id);
    if cause.is_canceled() {
        builder.cause(cause).build()
    } else {
        builder.kind(ErrorKind::Internal).cause(cause).build()
    }
}
