//! Builders for provider-shaped event bodies.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::{Map, Value, json};

use crate::domain::{Coordinates, Event, RawEvent};

/// Alexanderplatz, Berlin.
pub const BERLIN_LAT: f64 = 52.5219;
pub const BERLIN_LNG: f64 = 13.4132;

pub fn berlin() -> Coordinates {
    match Coordinates::new(BERLIN_LAT, BERLIN_LNG) {
        Ok(point) => point,
        Err(err) => panic!("fixture coordinates: {err}"),
    }
}

/// Fixed reference instant used across tests.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2017, 6, 10, 16, 0, 0).single() {
        Some(now) => now,
        None => panic!("fixture instant"),
    }
}

/// Start building a raw event `id` that starts at `start`.
///
/// Defaults: placed at [`berlin`], three hours long, with a street address
/// and an innocuous name.
pub fn raw_event(id: &str, start: DateTime<Utc>) -> RawEventBuilder {
    RawEventBuilder {
        id: id.to_owned(),
        name: format!("Event {id}"),
        description: String::new(),
        start,
        end: Some(start + TimeDelta::hours(3)),
        latitude: BERLIN_LAT,
        longitude: BERLIN_LNG,
        street: Some("Alexanderplatz 1".to_owned()),
    }
}

pub struct RawEventBuilder {
    id: String,
    name: String,
    description: String,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    latitude: f64,
    longitude: f64,
    street: Option<String>,
}

impl RawEventBuilder {
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        name.clone_into(&mut self.name);
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    #[must_use]
    pub fn lasting(mut self, duration: TimeDelta) -> Self {
        self.end = Some(self.start + duration);
        self
    }

    /// Omit `end_time` so decoding applies the default duration.
    #[must_use]
    pub fn without_end(mut self) -> Self {
        self.end = None;
        self
    }

    #[must_use]
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    #[must_use]
    pub fn without_street(mut self) -> Self {
        self.street = None;
        self
    }

    pub fn build(self) -> RawEvent {
        let mut location = Map::new();
        location.insert("latitude".to_owned(), json!(self.latitude));
        location.insert("longitude".to_owned(), json!(self.longitude));
        if let Some(street) = self.street {
            location.insert("street".to_owned(), Value::String(street));
        }
        let mut body = json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "start_time": self.start.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
            "place": { "name": "Fixture venue", "location": Value::Object(location) },
            "timezone": "Europe/Berlin",
        });
        if let (Some(end), Some(object)) = (self.end, body.as_object_mut()) {
            object.insert(
                "end_time".to_owned(),
                Value::String(end.format("%Y-%m-%dT%H:%M:%S%z").to_string()),
            );
        }
        RawEvent::new(body)
    }

    /// Build and decode in one step.
    pub fn build_event(self) -> Event {
        match self.build().decode() {
            Ok(event) => event,
            Err(err) => panic!("fixture event must decode: {err}"),
        }
    }
}
