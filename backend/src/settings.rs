//! Ingestion settings loaded via OrthoConfig.
//!
//! Values layer command-line flags over `EVENTDB_*` environment variables
//! over an optional configuration file; unset values fall back to the
//! defaults below.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::IngestionConfig;
use crate::outbound::graph::DEFAULT_GRAPH_ENDPOINT;

/// Configuration values for the event provider client and ingestion loop.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EVENTDB")]
pub struct EventdbSettings {
    /// Batch endpoint of the event provider.
    pub graph_endpoint: Option<String>,
    /// Request timeout for provider calls, in seconds.
    #[ortho_config(default = 30)]
    pub graph_timeout_secs: u64,
    /// Retries after the first failed attempt.
    pub max_retries: Option<u32>,
    /// Backoff unit in milliseconds.
    pub backoff_unit_ms: Option<u64>,
    /// Largest accepted batch of event ids.
    pub max_batch_size: Option<usize>,
}

impl EventdbSettings {
    /// Provider endpoint, falling back to the public API.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured endpoint is not a valid URL.
    pub fn graph_endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.graph_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_GRAPH_ENDPOINT),
        )
    }

    /// Provider request timeout.
    pub fn graph_timeout(&self) -> Duration {
        Duration::from_secs(self.graph_timeout_secs)
    }

    /// Ingestion limits with unset values taken from
    /// [`IngestionConfig::default`].
    pub fn ingestion_config(&self) -> IngestionConfig {
        let defaults = IngestionConfig::default();
        IngestionConfig {
            max_batch_size: self.max_batch_size.unwrap_or(defaults.max_batch_size),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            backoff_unit: self
                .backoff_unit_ms
                .map_or(defaults.backoff_unit, Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 5] = [
        "EVENTDB_GRAPH_ENDPOINT",
        "EVENTDB_GRAPH_TIMEOUT_SECS",
        "EVENTDB_MAX_RETRIES",
        "EVENTDB_BACKOFF_UNIT_MS",
        "EVENTDB_MAX_BATCH_SIZE",
    ];

    fn load_from_empty_args() -> EventdbSettings {
        EventdbSettings::load_from_iter([OsString::from("submit-events")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.graph_endpoint().expect("default endpoint").as_str(),
            "https://graph.facebook.com/"
        );
        assert_eq!(settings.graph_timeout(), Duration::from_secs(30));
        assert_eq!(settings.ingestion_config(), IngestionConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("EVENTDB_GRAPH_ENDPOINT", Some("http://localhost:8089".to_owned())),
            ("EVENTDB_GRAPH_TIMEOUT_SECS", Some("5".to_owned())),
            ("EVENTDB_MAX_RETRIES", Some("1".to_owned())),
            ("EVENTDB_BACKOFF_UNIT_MS", Some("250".to_owned())),
            ("EVENTDB_MAX_BATCH_SIZE", Some("10".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.graph_endpoint().expect("endpoint").as_str(),
            "http://localhost:8089/"
        );
        assert_eq!(settings.graph_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.ingestion_config(),
            IngestionConfig {
                max_batch_size: 10,
                max_retries: 1,
                backoff_unit: Duration::from_millis(250),
            }
        );
    }

    #[rstest]
    fn invalid_endpoints_are_reported() {
        let settings = EventdbSettings {
            graph_endpoint: Some("not a url".to_owned()),
            graph_timeout_secs: 30,
            max_retries: None,
            backoff_unit_ms: None,
            max_batch_size: None,
        };
        assert!(settings.graph_endpoint().is_err());
    }

    #[rstest]
    fn only_the_timeout_is_populated_without_overrides() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.graph_timeout_secs, 30);
        assert!(settings.graph_endpoint.is_none());
        assert!(settings.max_retries.is_none());
        assert!(settings.backoff_unit_ms.is_none());
        assert!(settings.max_batch_size.is_none());
    }
}
