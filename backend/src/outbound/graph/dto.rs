//! Wire types for the Graph-style batch API.

use serde::{Deserialize, Serialize};

/// OAuth error type reported for invalid or expired tokens.
const OAUTH_EXCEPTION: &str = "OAuthException";
/// Error code the provider uses for expired or revoked tokens.
const TOKEN_EXPIRED_CODE: i64 = 190;

#[derive(Debug, Serialize)]
pub(super) struct BatchRequestDto {
    pub(super) batch: Vec<BatchItemRequestDto>,
}

#[derive(Debug, Serialize)]
pub(super) struct BatchItemRequestDto {
    pub(super) method: &'static str,
    pub(super) relative_url: String,
}

/// One entry of the batch response. The provider returns `null` for
/// operations it did not complete.
#[derive(Debug, Deserialize)]
pub(super) struct BatchItemResponseDto {
    pub(super) code: u16,
    #[serde(default)]
    pub(super) body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: GraphErrorDto,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct GraphErrorDto {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default, rename = "type")]
    pub(super) error_type: String,
    #[serde(default)]
    pub(super) code: i64,
    #[serde(default)]
    pub(super) error_subcode: i64,
    #[serde(default)]
    pub(super) fbtrace_id: Option<String>,
}

impl GraphErrorDto {
    /// Parse an error envelope, falling back to a synthetic error that
    /// carries the decode failure.
    pub(super) fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorEnvelopeDto>(body) {
            Ok(envelope) => envelope.error,
            Err(err) => Self {
                message: format!("failed to decode error: {err}"),
                ..Self::default()
            },
        }
    }

    pub(super) fn is_token_expired(&self) -> bool {
        self.error_type == OAUTH_EXCEPTION && self.code == TOKEN_EXPIRED_CODE
    }

    pub(super) fn describe(&self) -> String {
        format!(
            "{} type={:?} code={} subcode={}",
            self.message, self.error_type, self.code, self.error_subcode
        )
    }
}
