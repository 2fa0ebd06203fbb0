//! Domain-level error model.
//!
//! Errors form a chain. Each layer records the operation it was performing,
//! optionally the user it acted for, a [`ErrorKind`] and the cause it wraps.
//! Construction normalises the chain so that one kind and one user id are
//! authoritative, which keeps both the rendered text and the status mapping
//! stable however deep the chain grows.
//!
//! These errors are transport agnostic. Inbound adapters map them to HTTP
//! responses via [`Error::status_code`].

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

/// Failure category carried by an [`Error`].
///
/// Variants are ordered; [`ErrorKind::Other`] is the zero value meaning "not
/// classified at this layer".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unclassified.
    #[default]
    Other,
    /// The request is malformed or fails validation.
    Invalid,
    /// The caller is anonymous but the operation needs an identity.
    NotLoggedIn,
    /// The caller is known but not allowed to perform the operation.
    Permission,
    /// The addressed item does not exist.
    NotExist,
    /// The item being created already exists.
    Exist,
    /// An unexpected failure inside the system or one of its collaborators.
    Internal,
}

impl ErrorKind {
    /// Whether this layer classifies the failure.
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Other)
    }

    /// HTTP-style status code for this kind.
    ///
    /// # Examples
    /// ```
    /// use eventdb::domain::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::NotExist.status_code(), 404);
    /// assert_eq!(ErrorKind::Other.status_code(), 500);
    /// ```
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Invalid => 400,
            Self::NotLoggedIn => 401,
            Self::Permission => 403,
            Self::NotExist => 404,
            Self::Exist => 409,
            Self::Internal | Self::Other => 500,
        }
    }

    /// Human-readable description used when rendering errors.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Other => "other error",
            Self::Invalid => "invalid request",
            Self::NotLoggedIn => "not logged in",
            Self::Permission => "permission denied",
            Self::NotExist => "item does not exist",
            Self::Exist => "item already exists",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Name of the operation that produced an error, e.g.
/// `DestinationService.generate_next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Op(&'static str);

impl Op {
    /// Wrap a static operation name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Borrow the operation name.
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// What an [`Error`] wraps.
#[derive(Debug, Clone)]
pub enum Cause {
    /// Another domain error, one layer further down.
    Domain(Box<Error>),
    /// A terminal, already-rendered failure from outside the domain.
    Message(String),
    /// The request was cancelled.
    Canceled,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(inner) => inner.fmt(f),
            Self::Message(message) => f.write_str(message),
            Self::Canceled => f.write_str("operation canceled"),
        }
    }
}

impl From<Error> for Cause {
    fn from(value: Error) -> Self {
        Self::Domain(Box::new(value))
    }
}

impl From<String> for Cause {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for Cause {
    fn from(value: &str) -> Self {
        Self::Message(value.to_owned())
    }
}

/// Chained, kind-classified domain error.
///
/// Build one with [`Error::at`] or [`Error::builder`]:
///
/// ```
/// use eventdb::domain::{Error, ErrorKind, Op, UserId};
///
/// let user = UserId::new("u-1").expect("valid id");
/// let inner = Error::builder()
///     .kind(ErrorKind::NotExist)
///     .cause("no such event")
///     .build();
/// let err = Error::at(Op::new("EventService.get"))
///     .user(&user)
///     .cause(inner)
///     .build();
///
/// assert_eq!(err.kind(), ErrorKind::NotExist);
/// assert_eq!(
///     err.to_string(),
///     "EventService.get, user u-1: item does not exist: no such event"
/// );
/// ```
#[derive(Clone)]
pub struct Error {
    op: Option<Op>,
    kind: ErrorKind,
    user_id: Option<UserId>,
    cause: Option<Cause>,
    stack: Option<Arc<Backtrace>>,
}

/// Incremental constructor for [`Error`]; normalisation happens in
/// [`ErrorBuilder::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct ErrorBuilder {
    op: Option<Op>,
    kind: ErrorKind,
    user_id: Option<UserId>,
    cause: Option<Cause>,
}

impl ErrorBuilder {
    /// Record the failing operation.
    pub fn op(mut self, op: Op) -> Self {
        self.op = Some(op);
        self
    }

    /// Classify the failure at this layer.
    pub fn kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record the user the operation acted for.
    pub fn user(mut self, user_id: &UserId) -> Self {
        self.user_id = Some(user_id.clone());
        self
    }

    /// Record the user when one is known.
    pub fn maybe_user(mut self, user_id: Option<&UserId>) -> Self {
        self.user_id = user_id.cloned();
        self
    }

    /// Wrap a cause: another [`Error`], a message, or a [`Cause`].
    pub fn cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Mark the failure as a cancellation.
    pub fn canceled(self) -> Self {
        self.cause(Cause::Canceled)
    }

    /// Normalise the chain and produce the error.
    pub fn build(self) -> Error {
        let Self {
            op,
            kind,
            user_id,
            cause,
        } = self;
        let (kind, cause) = match cause {
            Some(Cause::Domain(inner)) => {
                let (inner, kind) = fold_inner(*inner, kind, user_id.as_ref());
                (kind, Some(Cause::Domain(Box::new(inner))))
            }
            other => (kind, other),
        };
        Error {
            op,
            kind,
            user_id,
            cause,
            stack: capture_stack(),
        }
    }
}

/// Clear facts the outer layer already states and hoist the inner kind when
/// the outer layer does not classify.
fn fold_inner(
    mut inner: Error,
    outer_kind: ErrorKind,
    outer_user: Option<&UserId>,
) -> (Error, ErrorKind) {
    if outer_user.is_some() && inner.user_id.as_ref() == outer_user {
        inner.user_id = None;
    }
    if inner.kind == outer_kind {
        inner.kind = ErrorKind::Other;
    }
    let mut kind = outer_kind;
    if !kind.is_set() {
        kind = inner.kind;
        inner.kind = ErrorKind::Other;
    }
    (inner, kind)
}

fn capture_stack() -> Option<Arc<Backtrace>> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(Arc::new(backtrace)),
        _ => None,
    }
}

impl Error {
    /// Start building an error.
    pub fn builder() -> ErrorBuilder {
        ErrorBuilder::default()
    }

    /// Start building an error for `op`.
    pub fn at(op: Op) -> ErrorBuilder {
        ErrorBuilder::default().op(op)
    }

    /// Shorthand for a cancellation raised by `op`.
    pub fn canceled(op: Op) -> Self {
        Self::at(op).canceled().build()
    }

    /// Operation recorded at this layer.
    pub fn op(&self) -> Option<Op> {
        self.op
    }

    /// Authoritative kind at this layer.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// User recorded at this layer.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Wrapped cause, if any.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Backtrace captured at construction when backtraces are enabled.
    pub fn stack(&self) -> Option<&Backtrace> {
        self.stack.as_deref()
    }

    /// Whether the chain ends in a cancellation.
    pub fn is_canceled(&self) -> bool {
        match &self.cause {
            Some(Cause::Canceled) => true,
            Some(Cause::Domain(inner)) => inner.is_canceled(),
            _ => false,
        }
    }

    /// Transport status for this error.
    ///
    /// Cancellation reports 400: the client went away or gave up.
    pub fn status_code(&self) -> u16 {
        if self.is_canceled() {
            400
        } else {
            self.kind.status_code()
        }
    }

    fn is_zero(&self) -> bool {
        self.op.is_none()
            && !self.kind.is_set()
            && self.user_id.is_none()
            && self.cause.is_none()
    }
}

/// Report whether `err` carries `kind`.
///
/// The first layer that classifies the failure decides; unclassified layers
/// defer to their cause.
///
/// # Examples
/// ```
/// use eventdb::domain::{has_kind, Error, ErrorKind};
///
/// let err = Error::builder().kind(ErrorKind::Permission).build();
/// assert!(has_kind(ErrorKind::Permission, &err));
/// assert!(!has_kind(ErrorKind::Invalid, &err));
/// ```
pub fn has_kind(kind: ErrorKind, err: &Error) -> bool {
    if err.kind.is_set() {
        return err.kind == kind;
    }
    match &err.cause {
        Some(Cause::Domain(inner)) => has_kind(kind, inner),
        _ => false,
    }
}

/// Compare `err` against a partially populated `pattern`.
///
/// Only the fields set on the pattern are compared. Domain causes are
/// matched recursively; message causes compare by rendered text.
pub fn matches(pattern: &Error, err: &Error) -> bool {
    if pattern.op.is_some() && pattern.op != err.op {
        return false;
    }
    if pattern.user_id.is_some() && pattern.user_id != err.user_id {
        return false;
    }
    if pattern.kind.is_set() && pattern.kind != err.kind {
        return false;
    }
    match (&pattern.cause, &err.cause) {
        (None, _) => true,
        (Some(Cause::Domain(expected)), Some(Cause::Domain(actual))) => matches(expected, actual),
        (Some(Cause::Message(expected)), Some(actual)) => actual.to_string() == *expected,
        (Some(Cause::Canceled), Some(Cause::Canceled)) => true,
        _ => false,
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        if let Some(op) = self.op {
            out.push_str(op.as_str());
        }
        if let Some(user_id) = &self.user_id {
            pad(&mut out, ", ");
            out.push_str("user ");
            out.push_str(user_id.as_ref());
        }
        if self.kind.is_set() {
            pad(&mut out, ": ");
            out.push_str(self.kind.description());
        }
        match &self.cause {
            Some(Cause::Domain(inner)) if !inner.is_zero() => {
                pad(&mut out, ":\n\t");
                out.push_str(&inner.to_string());
            }
            Some(Cause::Domain(_)) | None => {}
            Some(cause) => {
                pad(&mut out, ": ");
                out.push_str(&cause.to_string());
            }
        }
        if out.is_empty() {
            return f.write_str("no error");
        }
        f.write_str(&out)
    }
}

fn pad(out: &mut String, separator: &str) {
    if !out.is_empty() {
        out.push_str(separator);
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("op", &self.op)
            .field("kind", &self.kind)
            .field("user_id", &self.user_id)
            .field("cause", &self.cause)
            .field("stack_captured", &self.stack.is_some())
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(Cause::Domain(inner)) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
