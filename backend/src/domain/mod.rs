//! Domain primitives, services and ports.
//!
//! Purpose: model events, destinations and callers, and host the services
//! that select destinations and ingest events. Adapters live in
//! `crate::outbound` and `crate::inbound` and talk to the domain only through
//! the traits in [`ports`].
//!
//! Public surface:
//! - Error, ErrorKind, Op: chained domain error model.
//! - Event, RawEvent, Destination: catalogue and history records.
//! - DestinationService: next-destination selection and history.
//! - IngestionService: credential-rotating event ingestion.
//! - EventService: event lookups.

pub mod classifier;
pub mod destination;
pub mod error;
pub mod event;
pub mod event_service;
pub mod geo;
pub mod identity;
pub mod ingestion;
pub mod ports;
pub mod selection;
pub mod user;

pub use self::classifier::{BadEventClassifier, Matcher, is_bad};
pub use self::destination::{
    Destination, DestinationId, DestinationUpdate, GenerateReply, GenerateResult, NewDestination,
};
pub use self::error::{Cause, Error, ErrorBuilder, ErrorKind, Op, has_kind, matches};
pub use self::event::{DEFAULT_EVENT_DURATION, Event, EventId, RawEvent, RawEventError};
pub use self::event_service::EventService;
pub use self::geo::{Coordinates, CoordinatesValidationError, Region, haversine_m};
pub use self::identity::{Actor, RequestContext, RequestedUser};
pub use self::ingestion::{
    BackoffJitter, IngestionConfig, IngestionPorts, IngestionRuntime, IngestionService,
    IngestionSummary, RandomJitter, RetrySleeper, TokioSleeper,
};
pub use self::selection::{DestinationService, GenerateRequest, SelectionConfig};
pub use self::user::{AccessToken, User, UserId, UserValidationError};
