//! Tests for HTTP error mapping.

use super::*;
use crate::domain::{Op, UserId};
use actix_web::body::to_bytes;
use rstest::rstest;
use serde_json::Value;

const OP: Op = Op::new("Handler.test");

fn kind_error(kind: ErrorKind) -> Error {
    Error::at(OP).kind(kind).cause("detail").build()
}

async fn body_of(error: &Error) -> Value {
    let response = ResponseError::error_response(error);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[rstest]
#[case(ErrorKind::Invalid, StatusCode::BAD_REQUEST)]
#[case(ErrorKind::NotLoggedIn, StatusCode::UNAUTHORIZED)]
#[case(ErrorKind::Permission, StatusCode::FORBIDDEN)]
#[case(ErrorKind::NotExist, StatusCode::NOT_FOUND)]
#[case(ErrorKind::Exist, StatusCode::CONFLICT)]
#[case(ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR)]
#[case(ErrorKind::Other, StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_kind(#[case] kind: ErrorKind, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&kind_error(kind)), expected);
}

#[rstest]
fn cancellation_is_a_client_error() {
    let err = Error::at(OP).cause(Error::canceled(Op::new("inner"))).build();
    assert_eq!(ResponseError::status_code(&err), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_errors_echo_their_text() {
    let err = kind_error(ErrorKind::Invalid);
    let body = body_of(&err).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], err.to_string());
}

#[tokio::test]
async fn internal_errors_hide_their_detail() {
    let user = UserId::new("alice").expect("valid id");
    let err = Error::at(OP)
        .kind(ErrorKind::Internal)
        .user(&user)
        .cause("database password rejected")
        .build();
    let body = body_of(&err).await;
    assert_eq!(body["status"], 500);
    assert_eq!(body["error"], "Internal Server Error");
}

#[rstest]
#[case(ErrorKind::Permission, PERMISSION_MESSAGE)]
#[case(ErrorKind::NotLoggedIn, NOT_LOGGED_IN_MESSAGE)]
#[case(ErrorKind::NotExist, "Not Found")]
#[tokio::test]
async fn other_kinds_use_fixed_text(#[case] kind: ErrorKind, #[case] expected: &str) {
    let body = body_of(&kind_error(kind)).await;
    assert_eq!(body["error"], expected);
}
