//! Event lookups for administrators and clients.

use std::sync::Arc;

use crate::domain::ports::{EventRepository, EventSearch};
use crate::domain::{Error, ErrorKind, Event, EventId, Op, RequestContext};

const SEARCH: Op = Op::new("EventService.search");
const GET: Op = Op::new("EventService.get");

/// Descriptions longer than this many characters are shortened in search
/// results.
pub const SEARCH_DESCRIPTION_LIMIT: usize = 100;

/// Read-side service over stored events.
#[derive(Clone)]
pub struct EventService<E> {
    events: Arc<E>,
}

impl<E> EventService<E> {
    pub fn new(events: Arc<E>) -> Self {
        Self { events }
    }
}

impl<E> EventService<E>
where
    E: EventRepository,
{
    /// Administrative search. Long descriptions are shortened to keep result
    /// pages small.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        search: &EventSearch,
    ) -> Result<Vec<Event>, Error> {
        let actor = ctx.actor();
        if !actor.is_admin() {
            return Err(Error::at(SEARCH)
                .kind(ErrorKind::Permission)
                .maybe_user(actor.id())
                .build());
        }
        if search.end <= search.start {
            return Err(Error::at(SEARCH)
                .kind(ErrorKind::Invalid)
                .maybe_user(actor.id())
                .cause("search range must end after it starts")
                .build());
        }
        if ctx.is_canceled() {
            return Err(Error::canceled(SEARCH));
        }
        let events = self.events.search(search).await.map_err(|err| {
            Error::at(SEARCH)
                .maybe_user(actor.id())
                .cause(Error::from(err))
                .build()
        })?;
        Ok(events.into_iter().map(truncate_description).collect())
    }

    /// One event by id.
    pub async fn get(&self, ctx: &RequestContext, id: &EventId) -> Result<Event, Error> {
        self.events.get_by_id(id).await.map_err(|err| {
            Error::at(GET)
                .maybe_user(ctx.actor().id())
                .cause(Error::from(err))
                .build()
        })
    }
}

fn truncate_description(mut event: Event) -> Event {
    if event.description.chars().count() > SEARCH_DESCRIPTION_LIMIT {
        let mut shortened: String = event
            .description
            .chars()
            .take(SEARCH_DESCRIPTION_LIMIT - 3)
            .collect();
        shortened.push('…');
        event.description = shortened;
    }
    event
}
