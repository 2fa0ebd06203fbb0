//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use tracing::error;

use crate::domain::{Error, ErrorKind};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const PERMISSION_MESSAGE: &str = "access to this resource is restricted";
const NOT_LOGGED_IN_MESSAGE: &str =
    "this resource requires a signed-in user; send a valid identity token";

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

impl ErrorBody {
    /// Client-facing body for `err`. Internal detail is never exposed.
    pub fn from_error(err: &Error) -> Self {
        let status = status_for(err);
        let message = if err.is_canceled() {
            "request canceled".to_owned()
        } else {
            match err.kind() {
                ErrorKind::Invalid => err.to_string(),
                ErrorKind::Permission => PERMISSION_MESSAGE.to_owned(),
                ErrorKind::NotLoggedIn => NOT_LOGGED_IN_MESSAGE.to_owned(),
                _ => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_owned(),
            }
        };
        Self {
            error: message,
            status: status.as_u16(),
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = status_for(self);
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(ErrorBody::from_error(self))
    }
}

#[cfg(test)]
mod tests;
