//! Reqwest-backed event source adapter for the Graph-style batch API.
//!
//! This adapter owns transport details only: batch request serialisation,
//! timeout and HTTP error mapping, and splitting the batch response into raw
//! event bodies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::warn;

use super::dto::{BatchItemRequestDto, BatchItemResponseDto, BatchRequestDto, GraphErrorDto};
use crate::domain::ports::{EventSource, EventSourceError};
use crate::domain::{AccessToken, EventId, RawEvent};

/// Public Graph API endpoint.
pub const DEFAULT_GRAPH_ENDPOINT: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v2.9";
const DEFAULT_USER_AGENT: &str = "eventdb-ingestion/0.1";
const EVENT_FIELDS: &str = "attending_count,can_guests_invite,can_viewer_post,category,cover,\
declined_count,description,end_time,guest_list_enabled,interested_count,is_canceled,is_draft,\
is_page_owned,is_viewer_admin,id,maybe_count,name,noreply_count,owner,parent_group,place,\
start_time,ticket_uri,timezone,type,updated_time";

/// Event source adapter that POSTs one batch request per fetch.
pub struct GraphHttpEventSource {
    client: Client,
    endpoint: Url,
}

impl GraphHttpEventSource {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl EventSource for GraphHttpEventSource {
    async fn fetch_batch(
        &self,
        token: &AccessToken,
        ids: &[EventId],
    ) -> Result<Vec<RawEvent>, EventSourceError> {
        let request = build_batch_request(DEFAULT_API_VERSION, ids);
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_batch_response(ids, body.as_ref())
    }
}

fn build_batch_request(api_version: &str, ids: &[EventId]) -> BatchRequestDto {
    BatchRequestDto {
        batch: ids
            .iter()
            .map(|id| BatchItemRequestDto {
                method: "GET",
                relative_url: format!("{api_version}/{id}?fields={EVENT_FIELDS}"),
            })
            .collect(),
    }
}

fn parse_batch_response(ids: &[EventId], body: &[u8]) -> Result<Vec<RawEvent>, EventSourceError> {
    let items: Vec<Option<BatchItemResponseDto>> = serde_json::from_slice(body).map_err(|error| {
        EventSourceError::decode(format!("invalid batch response payload: {error}"))
    })?;

    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let event_id = ids.get(index).map_or("<unknown>", AsRef::as_ref);
        let Some(item) = item else {
            warn!(event_id, "batch operation not completed; dropping");
            continue;
        };
        let item_body = item.body.unwrap_or_default();
        if item.code != StatusCode::OK.as_u16() {
            let error = GraphErrorDto::parse(item_body.as_bytes());
            if error.is_token_expired() {
                return Err(EventSourceError::credential_expired(error.describe()));
            }
            warn!(
                event_id,
                code = error.code,
                subcode = error.error_subcode,
                error_type = %error.error_type,
                trace_id = error.fbtrace_id.as_deref().unwrap_or_default(),
                error = %error.message,
                "event lookup failed; dropping"
            );
            continue;
        }
        match RawEvent::from_slice(item_body.as_bytes()) {
            Ok(raw) => events.push(raw),
            Err(error) => warn!(event_id, error = %error, "event body undecodable; dropping"),
        }
    }
    Ok(events)
}

fn map_transport_error(error: reqwest::Error) -> EventSourceError {
    if error.is_timeout() {
        EventSourceError::timeout(error.to_string())
    } else {
        EventSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> EventSourceError {
    let error = GraphErrorDto::parse(body);
    if error.is_token_expired() {
        return EventSourceError::credential_expired(error.describe());
    }

    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => EventSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            EventSourceError::timeout(message)
        }
        _ if status.is_client_error() => EventSourceError::rejected(message),
        _ => EventSourceError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
