//! Driven port lending stored provider credentials to ingestion.

use async_trait::async_trait;

use super::CandidateStoreError;
use crate::domain::{AccessToken, UserId};

/// A provider token together with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub owner: UserId,
    pub token: AccessToken,
}

/// Port for rotating through users' provider credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// A credential chosen uniformly at random among users holding a
    /// non-empty token; `NotFound` when nobody does.
    async fn random_credential(&self) -> Result<Credential, CandidateStoreError>;

    /// Blank the token stored for `owner`.
    async fn clear_credential(&self, owner: &UserId) -> Result<(), CandidateStoreError>;
}
