//! Port and runtime dependency bundles for the ingestion service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::domain::classifier::BadEventClassifier;
use crate::domain::ports::{CredentialRepository, EventRepository, EventSource};

use super::{BackoffJitter, RetrySleeper};

/// Port bundle required by the ingestion service.
pub struct IngestionPorts {
    /// Outbound provider adapter.
    pub source: Arc<dyn EventSource>,
    /// Event persistence adapter.
    pub events: Arc<dyn EventRepository>,
    /// Credential rotation adapter.
    pub credentials: Arc<dyn CredentialRepository>,
    /// Bad-event rules applied to stored events.
    pub classifier: Arc<BadEventClassifier>,
}

impl IngestionPorts {
    /// Build a port bundle with the built-in classifier rules.
    pub fn new(
        source: Arc<dyn EventSource>,
        events: Arc<dyn EventRepository>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self {
            source,
            events,
            credentials,
            classifier: Arc::new(BadEventClassifier::standard()),
        }
    }

    /// Replace the classifier rules.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<BadEventClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Runtime helpers used by retry pacing.
pub struct IngestionRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for IngestionRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Uniform jitter in `[0, unit)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, unit: Duration) -> Duration {
        let fraction: f64 = rand::thread_rng().gen_range(0.0..1.0);
        base.saturating_add(unit.mul_f64(fraction))
    }
}
