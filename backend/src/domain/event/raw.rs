//! Raw provider payloads and their decoding into [`Event`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{DEFAULT_EVENT_DURATION, Event, EventId};

/// Errors raised while decoding a raw event body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RawEventError {
    /// The body is not a JSON object of the expected shape.
    #[error("malformed event body: {0}")]
    Malformed(String),
    /// The body has no usable identifier.
    #[error("event body has no id")]
    MissingId,
    /// The body has no start time.
    #[error("event {0} has no start_time")]
    MissingStartTime(EventId),
    /// A timestamp could not be parsed.
    #[error("event {id} has unparseable {field}: {value}")]
    InvalidTime {
        id: EventId,
        field: &'static str,
        value: String,
    },
    /// The end time precedes the start time.
    #[error("event {0} ends before it starts")]
    EndBeforeStart(EventId),
}

/// Raw JSON body returned by the external provider for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent(Value);

impl RawEvent {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    /// Parse a body from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RawEventError> {
        serde_json::from_slice(bytes)
            .map(Self)
            .map_err(|err| RawEventError::Malformed(err.to_string()))
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Identifier, when the body carries a string id.
    pub fn id(&self) -> Option<EventId> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(EventId::new)
    }

    /// Decode the searchable fields.
    ///
    /// Missing end times default to one hour after the start. Coordinates
    /// default to zero and text fields to empty when absent.
    ///
    /// # Examples
    /// ```
    /// use eventdb::domain::RawEvent;
    /// use serde_json::json;
    ///
    /// let raw = RawEvent::new(json!({
    ///     "id": "1",
    ///     "name": "Open air cinema",
    ///     "start_time": "2017-06-10T19:00:00+0200",
    /// }));
    /// let event = raw.decode().expect("decodes");
    /// assert_eq!((event.end_time - event.start_time).num_minutes(), 60);
    /// ```
    pub fn decode(&self) -> Result<Event, RawEventError> {
        let dto: RawEventDto = serde_json::from_value(self.0.clone())
            .map_err(|err| RawEventError::Malformed(err.to_string()))?;
        let id = match dto.id {
            Some(id) if !id.is_empty() => EventId::new(id),
            _ => return Err(RawEventError::MissingId),
        };
        let Some(start_raw) = dto.start_time else {
            return Err(RawEventError::MissingStartTime(id));
        };
        let start_time = parse_time(&id, "start_time", &start_raw)?;
        let end_time = match dto.end_time {
            Some(end_raw) => parse_time(&id, "end_time", &end_raw)?,
            None => start_time + DEFAULT_EVENT_DURATION,
        };
        if end_time < start_time {
            return Err(RawEventError::EndBeforeStart(id));
        }

        let place = dto.place.unwrap_or_default();
        let location = place.location.unwrap_or_default();
        Ok(Event {
            id,
            name: dto.name.unwrap_or_default(),
            description: dto.description.unwrap_or_default(),
            latitude: location.latitude.unwrap_or_default(),
            longitude: location.longitude.unwrap_or_default(),
            start_time,
            end_time,
            is_canceled: dto.is_canceled.unwrap_or(false),
            is_bad: false,
            cover_url: dto.cover.and_then(|cover| cover.source),
            place_name: place.name,
            address: location.street,
            time_zone: dto.timezone,
        })
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Accept RFC 3339 and the provider's `+hhmm` offset form.
fn parse_time(id: &EventId, field: &'static str, raw: &str) -> Result<DateTime<Utc>, RawEventError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| RawEventError::InvalidTime {
            id: id.clone(),
            field,
            value: raw.to_owned(),
        })
}

#[derive(Debug, Deserialize)]
struct RawEventDto {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    is_canceled: Option<bool>,
    cover: Option<CoverDto>,
    place: Option<PlaceDto>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoverDto {
    source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceDto {
    name: Option<String>,
    location: Option<LocationDto>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationDto {
    latitude: Option<f64>,
    longitude: Option<f64>,
    street: Option<String>,
}
