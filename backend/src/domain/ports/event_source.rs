//! Driven port for fetching raw event bodies from the external provider.
//!
//! The domain owns the call shape and error contract so the ingestion
//! pipeline stays adapter-agnostic.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{AccessToken, EventId, RawEvent};

define_port_error! {
    /// Errors surfaced while calling the external event source.
    pub enum EventSourceError {
        /// The access token was revoked or has expired.
        CredentialExpired { message: String } =>
            "event source credential expired: {message}",
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "event source transport failed: {message}",
        /// The call exceeded its timeout.
        Timeout { message: String } =>
            "event source timeout: {message}",
        /// The provider throttled the request.
        RateLimited { message: String } =>
            "event source rate limited request: {message}",
        /// The provider refused the request.
        Rejected { message: String } =>
            "event source rejected request: {message}",
        /// The response could not be decoded.
        Decode { message: String } =>
            "event source response decode failed: {message}",
    }
}

impl EventSourceError {
    /// Return whether retrying this error is expected to help.
    ///
    /// Expired credentials count as retryable: the next attempt rotates to a
    /// different token.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CredentialExpired { .. }
                | Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
        )
    }

    /// Stable snake_case name of the failure class.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::CredentialExpired { .. } => "credential_expired",
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::Rejected { .. } => "rejected",
            Self::Decode { .. } => "decode",
        }
    }
}

/// Port for the external provider's batch lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch raw bodies for `ids` in one call.
    ///
    /// Bodies the provider fails to return individually are dropped, so the
    /// result may be shorter than `ids`.
    async fn fetch_batch(
        &self,
        token: &AccessToken,
        ids: &[EventId],
    ) -> Result<Vec<RawEvent>, EventSourceError>;
}
