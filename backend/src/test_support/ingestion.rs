//! Shared test doubles for ingestion tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::ports::{EventSource, EventSourceError};
use crate::domain::{AccessToken, BackoffJitter, EventId, RawEvent, RetrySleeper};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RetrySleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

/// Sleeper that fires the request's cancellation token and never wakes.
pub struct CancellingSleeper(pub CancellationToken);

#[async_trait]
impl RetrySleeper for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.0.cancel();
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _unit: Duration) -> Duration {
        base
    }
}

/// Event source replaying scripted responses and recording the tokens and
/// ids it was called with.
pub struct ScriptedEventSource {
    scripted: Mutex<VecDeque<Result<Vec<RawEvent>, EventSourceError>>>,
    calls: Mutex<Vec<(String, Vec<EventId>)>>,
}

impl ScriptedEventSource {
    pub fn new(scripted: Vec<Result<Vec<RawEvent>, EventSourceError>>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Tokens presented, in call order.
    pub fn tokens(&self) -> Vec<String> {
        self.lock_calls()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<EventId>)>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("source calls mutex"),
        }
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn fetch_batch(
        &self,
        token: &AccessToken,
        ids: &[EventId],
    ) -> Result<Vec<RawEvent>, EventSourceError> {
        self.lock_calls()
            .push((token.expose().to_owned(), ids.to_vec()));
        let next = match self.scripted.lock() {
            Ok(mut scripted) => scripted.pop_front(),
            Err(_) => panic!("source script mutex"),
        };
        next.unwrap_or_else(|| {
            Err(EventSourceError::rejected(
                "source script exhausted unexpectedly",
            ))
        })
    }
}
