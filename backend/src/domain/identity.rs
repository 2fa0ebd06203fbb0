//! Caller identity and the per-request context threaded through services.

use tokio_util::sync::CancellationToken;

use super::{UserId, UserValidationError};

/// Authenticated (or anonymous) caller of a domain operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    id: Option<UserId>,
    is_admin: bool,
}

impl Actor {
    /// Caller without an identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Regular signed-in user.
    pub fn user(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_admin: false,
        }
    }

    /// Signed-in administrator.
    pub fn admin(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_admin: true,
        }
    }

    pub fn id(&self) -> Option<&UserId> {
        self.id.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether the actor may act on resources owned by `owner`.
    pub fn can_access(&self, owner: &UserId) -> bool {
        self.is_admin || self.id.as_ref() == Some(owner)
    }
}

/// User addressed by a request: the caller itself or someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedUser {
    /// The caller; spelled `me` or left empty on the wire.
    Me,
    /// A specific user.
    User(UserId),
}

impl RequestedUser {
    /// Parse a wire value.
    ///
    /// # Examples
    /// ```
    /// use eventdb::domain::RequestedUser;
    ///
    /// assert_eq!(RequestedUser::parse("me"), Ok(RequestedUser::Me));
    /// assert_eq!(RequestedUser::parse(""), Ok(RequestedUser::Me));
    /// assert!(matches!(RequestedUser::parse("42"), Ok(RequestedUser::User(_))));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        match raw {
            "" | "me" => Ok(Self::Me),
            other => UserId::new(other).map(Self::User),
        }
    }

    /// Resolve against the caller's id.
    pub fn resolve(&self, actor_id: &UserId) -> UserId {
        match self {
            Self::Me => actor_id.clone(),
            Self::User(id) => id.clone(),
        }
    }
}

/// Identity and cancellation for one inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    actor: Actor,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Context with a fresh, never-fired cancellation token.
    pub fn new(actor: Actor) -> Self {
        Self::with_cancellation(actor, CancellationToken::new())
    }

    /// Context bound to an existing cancellation token.
    pub fn with_cancellation(actor: Actor, cancellation: CancellationToken) -> Self {
        Self {
            actor,
            cancellation,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the request has been abandoned.
    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
