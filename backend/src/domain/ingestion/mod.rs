//! Event ingestion: fetch event bodies from the external provider with
//! borrowed user credentials, then store and classify them.
//!
//! Each attempt borrows one credential at random. Transient provider failures
//! and expired credentials are retried with jittered exponential backoff; an
//! expired credential is blanked on its owner before the next attempt so
//! rotation moves on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::classifier::BadEventClassifier;
use crate::domain::ports::{CredentialRepository, EventRepository, EventSource, EventSourceError};
use crate::domain::{Error, ErrorKind, EventId, Op, RawEvent, RequestContext, UserId};

mod attempt_error;
mod mapping;
mod runtime;

use attempt_error::AttemptError;
pub use runtime::{IngestionPorts, IngestionRuntime, RandomJitter, TokioSleeper};

const SUBMIT: Op = Op::new("IngestionService.submit");

/// Limits and pacing for event submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Largest accepted batch of event ids.
    pub max_batch_size: usize,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff unit; the delay before a retry is `2^remaining` units plus
    /// up to one unit of jitter.
    pub backoff_unit: Duration,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Add jitter to `base`; the extra delay must stay below `unit`.
    ///
    /// ```rust
    /// use eventdb::domain::BackoffJitter;
    /// use std::time::Duration;
    ///
    /// struct HalfUnit;
    /// impl BackoffJitter for HalfUnit {
    ///     fn jittered_delay(&self, base: Duration, unit: Duration) -> Duration {
    ///         base + unit / 2
    ///     }
    /// }
    /// let delay = HalfUnit.jittered_delay(Duration::from_secs(4), Duration::from_secs(1));
    /// assert_eq!(delay, Duration::from_millis(4500));
    /// ```
    fn jittered_delay(&self, base: Duration, unit: Duration) -> Duration;
}

/// Counts reported for one successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestionSummary {
    /// Attempts used, including the successful one.
    pub attempts: u32,
    /// Bodies returned by the provider and stored.
    pub stored: usize,
    /// Stored events the classifier flagged.
    pub flagged: usize,
}

/// Domain service submitting event ids for ingestion.
pub struct IngestionService {
    source: Arc<dyn EventSource>,
    events: Arc<dyn EventRepository>,
    credentials: Arc<dyn CredentialRepository>,
    classifier: Arc<BadEventClassifier>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: IngestionConfig,
}

impl IngestionService {
    /// Build a service using the Tokio sleeper and random jitter.
    pub fn new(ports: IngestionPorts, config: IngestionConfig) -> Self {
        Self::with_runtime(ports, IngestionRuntime::default(), config)
    }

    /// Build a service with injected runtime abstractions.
    pub fn with_runtime(
        ports: IngestionPorts,
        runtime: IngestionRuntime,
        config: IngestionConfig,
    ) -> Self {
        Self {
            source: ports.source,
            events: ports.events,
            credentials: ports.credentials,
            classifier: ports.classifier,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Fetch, store and classify the events named by `event_ids`.
    ///
    /// Anonymous callers get `Permission`; batches over the configured limit
    /// get `Invalid`. Both are refused before any collaborator is called.
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        event_ids: &[EventId],
    ) -> Result<IngestionSummary, Error> {
        let Some(user_id) = ctx.actor().id() else {
            return Err(Error::at(SUBMIT)
                .kind(ErrorKind::Permission)
                .cause("event submission requires a signed-in user")
                .build());
        };
        if event_ids.len() > self.config.max_batch_size {
            return Err(Error::at(SUBMIT)
                .kind(ErrorKind::Invalid)
                .user(user_id)
                .cause(format!(
                    "{} event ids submitted; at most {} are accepted per batch",
                    event_ids.len(),
                    self.config.max_batch_size
                ))
                .build());
        }
        if event_ids.is_empty() {
            return Ok(IngestionSummary::default());
        }

        let mut remaining = self.config.max_retries;
        let mut attempt = 0_u32;
        loop {
            if ctx.is_canceled() {
                return Err(canceled(user_id));
            }
            attempt += 1;
            match self.run_attempt(event_ids).await {
                Ok((stored, flagged)) => {
                    let summary = IngestionSummary {
                        attempts: attempt,
                        stored,
                        flagged,
                    };
                    info!(
                        user_id = %user_id,
                        requested = event_ids.len(),
                        stored,
                        flagged,
                        attempts = attempt,
                        "event batch ingested"
                    );
                    return Ok(summary);
                }
                Err(AttemptError::Retryable(cause)) if remaining > 0 => {
                    remaining -= 1;
                    let delay = self.backoff_delay(remaining);
                    warn!(
                        user_id = %user_id,
                        attempt,
                        remaining,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %cause,
                        "event fetch attempt failed; retrying"
                    );
                    if ctx.is_canceled() {
                        return Err(canceled(user_id));
                    }
                    tokio::select! {
                        () = ctx.cancellation().cancelled() => return Err(canceled(user_id)),
                        () = self.sleeper.sleep(delay) => {}
                    }
                }
                Err(AttemptError::Retryable(cause) | AttemptError::Fatal(cause)) => {
                    warn!(user_id = %user_id, attempts = attempt, error = %cause, "event submission failed");
                    return Err(Error::at(SUBMIT).user(user_id).cause(cause).build());
                }
            }
        }
    }

    fn backoff_delay(&self, remaining: u32) -> Duration {
        let unit = self.config.backoff_unit;
        let base = unit.saturating_mul(2_u32.saturating_pow(remaining));
        self.jitter.jittered_delay(base, unit)
    }

    async fn run_attempt(&self, event_ids: &[EventId]) -> Result<(usize, usize), AttemptError> {
        let credential = self
            .credentials
            .random_credential()
            .await
            .map_err(|err| AttemptError::Fatal(mapping::map_credential_error(err)))?;

        match self.source.fetch_batch(&credential.token, event_ids).await {
            Ok(bodies) => self.persist_batch(bodies).await.map_err(AttemptError::Fatal),
            Err(EventSourceError::CredentialExpired { message }) => {
                self.expire_credential(&credential.owner).await?;
                Err(AttemptError::Retryable(mapping::map_expired_credential(
                    &credential.owner,
                    &message,
                )))
            }
            Err(err) if err.is_retryable() => {
                Err(AttemptError::Retryable(mapping::map_source_error(&err)))
            }
            Err(err) => Err(AttemptError::Fatal(mapping::map_source_error(&err))),
        }
    }

    async fn expire_credential(&self, owner: &UserId) -> Result<(), AttemptError> {
        self.credentials
            .clear_credential(owner)
            .await
            .map_err(|err| AttemptError::Fatal(mapping::map_clear_credential_error(owner, err)))?;
        warn!(owner = %owner, "provider credential expired; cleared from owner");
        Ok(())
    }

    async fn persist_batch(&self, bodies: Vec<RawEvent>) -> Result<(usize, usize), Error> {
        let mut stored = 0;
        let mut flagged = 0;
        for raw in bodies {
            let event = self
                .events
                .upsert(&raw)
                .await
                .map_err(mapping::map_save_error)?;
            let is_bad = self.classifier.is_bad(&event);
            self.events
                .set_bad(&event.id, is_bad)
                .await
                .map_err(mapping::map_mark_error)?;
            stored += 1;
            if is_bad {
                flagged += 1;
            }
        }
        Ok((stored, flagged))
    }
}

fn canceled(user_id: &UserId) -> Error {
    Error::at(SUBMIT).user(user_id).canceled().build()
}
