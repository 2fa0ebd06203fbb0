//! Destinations: events handed out to a user, and the selection outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Event, EventId, UserId};

/// Store-assigned destination identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for DestinationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request to record a new destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDestination {
    pub user_id: UserId,
    pub event_id: EventId,
}

/// An event selected for a user.
///
/// ## Invariants
/// - `user_id` and `event_id` never change after creation; only `status`
///   and `feedback` are mutable, through [`DestinationUpdate`].
/// - `event` is populated on read only and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    id: DestinationId,
    user_id: UserId,
    event_id: EventId,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<Event>,
    status: String,
    feedback: String,
    created_at: DateTime<Utc>,
}

impl Destination {
    /// Materialise a freshly stored destination.
    pub fn new(id: DestinationId, request: NewDestination, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: request.user_id,
            event_id: request.event_id,
            event: None,
            status: String::new(),
            feedback: String::new(),
            created_at,
        }
    }

    pub fn id(&self) -> &DestinationId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attach the side-loaded event.
    #[must_use]
    pub fn with_event(mut self, event: Option<Event>) -> Self {
        self.event = event;
        self
    }

    /// Apply the fields present in `update`.
    pub fn apply(&mut self, update: &DestinationUpdate) {
        if let Some(status) = &update.status {
            self.status.clone_from(status);
        }
        if let Some(feedback) = &update.feedback {
            self.feedback.clone_from(feedback);
        }
    }
}

/// Partial update of a destination; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl DestinationUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.feedback.is_none()
    }
}

/// Outcome of a next-destination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerateResult {
    /// A new destination was selected.
    Ok,
    /// The current destination has not started yet.
    Wait,
    /// Nothing feasible within the search horizon.
    NoResults,
}

/// Reply to a next-destination request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateReply {
    pub result: GenerateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    pub history: Vec<Destination>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn destination() -> Destination {
        Destination::new(
            DestinationId::new("d1"),
            NewDestination {
                user_id: UserId::new("u1").expect("valid id"),
                event_id: EventId::new("e1"),
            },
            Utc.with_ymd_and_hms(2017, 6, 10, 12, 0, 0)
                .single()
                .expect("valid time"),
        )
    }

    #[rstest]
    fn apply_changes_only_present_fields(mut destination: Destination) {
        destination.apply(&DestinationUpdate {
            status: Some("visited".to_owned()),
            feedback: None,
        });
        destination.apply(&DestinationUpdate {
            status: None,
            feedback: Some("great".to_owned()),
        });

        assert_eq!(destination.status(), "visited");
        assert_eq!(destination.feedback(), "great");
        assert_eq!(destination.event_id(), &EventId::new("e1"));
    }

    #[rstest]
    #[case(GenerateResult::Ok, "\"ok\"")]
    #[case(GenerateResult::Wait, "\"wait\"")]
    #[case(GenerateResult::NoResults, "\"no-results\"")]
    fn generate_result_wire_names(#[case] result: GenerateResult, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&result).expect("serialise"), expected);
    }

    #[rstest]
    fn empty_update_is_detected() {
        assert!(DestinationUpdate::default().is_empty());
    }
}
