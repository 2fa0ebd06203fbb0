//! Tests for error chain normalisation, predicates and rendering.

use super::*;
use rstest::{fixture, rstest};

const OP_OUTER: Op = Op::new("Outer.call");
const OP_INNER: Op = Op::new("Inner.call");

#[fixture]
fn alice() -> UserId {
    UserId::new("alice").expect("valid user id")
}

#[fixture]
fn bob() -> UserId {
    UserId::new("bob").expect("valid user id")
}

fn inner_cause(err: &Error) -> &Error {
    match err.cause() {
        Some(Cause::Domain(inner)) => inner,
        other => panic!("expected domain cause, got {other:?}"),
    }
}

#[rstest]
fn empty_error_renders_no_error() {
    assert_eq!(Error::builder().build().to_string(), "no error");
}

#[rstest]
fn outer_other_adopts_inner_kind(alice: UserId) {
    let inner = Error::at(OP_INNER)
        .kind(ErrorKind::NotExist)
        .cause("missing row")
        .build();
    let outer = Error::at(OP_OUTER).user(&alice).cause(inner).build();

    assert_eq!(outer.kind(), ErrorKind::NotExist);
    assert_eq!(inner_cause(&outer).kind(), ErrorKind::Other);
}

#[rstest]
fn repeated_kind_is_demoted_on_inner() {
    let inner = Error::at(OP_INNER).kind(ErrorKind::Internal).build();
    let outer = Error::at(OP_OUTER)
        .kind(ErrorKind::Internal)
        .cause(inner)
        .build();

    assert_eq!(outer.kind(), ErrorKind::Internal);
    assert_eq!(inner_cause(&outer).kind(), ErrorKind::Other);
}

#[rstest]
fn distinct_kinds_are_both_kept() {
    let inner = Error::at(OP_INNER).kind(ErrorKind::NotExist).build();
    let outer = Error::at(OP_OUTER)
        .kind(ErrorKind::Internal)
        .cause(inner)
        .build();

    assert_eq!(outer.kind(), ErrorKind::Internal);
    assert_eq!(inner_cause(&outer).kind(), ErrorKind::NotExist);
    assert!(has_kind(ErrorKind::Internal, &outer));
    assert!(!has_kind(ErrorKind::NotExist, &outer));
}

#[rstest]
fn repeated_user_is_cleared_on_inner(alice: UserId) {
    let inner = Error::at(OP_INNER).user(&alice).build();
    let outer = Error::at(OP_OUTER).user(&alice).cause(inner).build();

    assert_eq!(outer.user_id(), Some(&alice));
    assert_eq!(inner_cause(&outer).user_id(), None);
}

#[rstest]
fn different_user_is_kept_on_inner(alice: UserId, bob: UserId) {
    let inner = Error::at(OP_INNER).user(&bob).build();
    let outer = Error::at(OP_OUTER).user(&alice).cause(inner).build();

    assert_eq!(inner_cause(&outer).user_id(), Some(&bob));
}

#[rstest]
fn has_kind_descends_through_unclassified_layers() {
    let root = Error::builder().kind(ErrorKind::Exist).build();
    let middle = Error::at(OP_INNER).cause(root).build();
    let outer = Error::at(OP_OUTER).cause(middle).build();

    assert!(has_kind(ErrorKind::Exist, &outer));
}

#[rstest]
fn has_kind_is_false_for_message_only_chain() {
    let err = Error::at(OP_OUTER).cause("plain failure").build();
    assert!(!has_kind(ErrorKind::Other, &err));
    assert!(!has_kind(ErrorKind::Internal, &err));
}

#[rstest]
fn display_joins_layers(alice: UserId) {
    let inner = Error::at(OP_INNER)
        .kind(ErrorKind::NotExist)
        .cause("no row")
        .build();
    let outer = Error::at(OP_OUTER)
        .kind(ErrorKind::Internal)
        .user(&alice)
        .cause(inner)
        .build();

    assert_eq!(
        outer.to_string(),
        "Outer.call, user alice: internal error:\n\tInner.call: item does not exist: no row"
    );
}

#[rstest]
fn display_of_cancellation() {
    let err = Error::canceled(OP_OUTER);
    assert_eq!(err.to_string(), "Outer.call: operation canceled");
}

#[rstest]
#[case::op_only(Error::at(OP_OUTER).build(), true)]
#[case::kind_only(Error::builder().kind(ErrorKind::Permission).build(), true)]
#[case::wrong_kind(Error::builder().kind(ErrorKind::Invalid).build(), false)]
#[case::wrong_op(Error::at(OP_INNER).build(), false)]
#[case::message(Error::builder().cause("denied").build(), true)]
#[case::wrong_message(Error::builder().cause("other").build(), false)]
fn matches_compares_only_set_fields(#[case] pattern: Error, #[case] expected: bool) {
    let err = Error::at(OP_OUTER)
        .kind(ErrorKind::Permission)
        .cause("denied")
        .build();
    assert_eq!(matches(&pattern, &err), expected);
}

#[rstest]
fn matches_recurses_into_domain_causes(alice: UserId) {
    let err = Error::at(OP_OUTER)
        .user(&alice)
        .cause(
            Error::at(OP_INNER)
                .kind(ErrorKind::NotExist)
                .cause("no row")
                .build(),
        )
        .build();
    let pattern = Error::at(OP_OUTER)
        .cause(Error::at(OP_INNER).build())
        .build();
    let mismatched = Error::at(OP_OUTER)
        .cause(Error::at(OP_OUTER).build())
        .build();

    assert!(matches(&pattern, &err));
    assert!(!matches(&mismatched, &err));
}

#[rstest]
fn cancellation_survives_wrapping_and_maps_to_400() {
    let inner = Error::canceled(OP_INNER);
    let outer = Error::at(OP_OUTER).cause(inner).build();

    assert!(outer.is_canceled());
    assert_eq!(outer.status_code(), 400);
    assert_eq!(outer.kind(), ErrorKind::Other);
}

#[rstest]
#[case(ErrorKind::Invalid, 400)]
#[case(ErrorKind::NotLoggedIn, 401)]
#[case(ErrorKind::Permission, 403)]
#[case(ErrorKind::NotExist, 404)]
#[case(ErrorKind::Exist, 409)]
#[case(ErrorKind::Internal, 500)]
#[case(ErrorKind::Other, 500)]
fn status_codes_follow_kind(#[case] kind: ErrorKind, #[case] status: u16) {
    let err = Error::builder().kind(kind).cause("boom").build();
    assert_eq!(err.status_code(), status);
}

#[rstest]
fn source_exposes_inner_error() {
    use std::error::Error as _;

    let outer = Error::at(OP_OUTER)
        .cause(Error::at(OP_INNER).kind(ErrorKind::Invalid).build())
        .build();
    let source = outer.source().expect("inner error is exposed");
    assert_eq!(source.to_string(), "Inner.call");
}
