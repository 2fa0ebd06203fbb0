//! Fetch events from the provider, classify them, and print them as JSON lines.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use eventdb::domain::ports::EventRepository;
use eventdb::domain::{
    AccessToken, Actor, EventId, IngestionPorts, IngestionService, RequestContext, User, UserId,
};
use eventdb::outbound::graph::GraphHttpEventSource;
use eventdb::outbound::memory::InMemoryCandidateStore;
use eventdb::settings::EventdbSettings;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const TOKEN_ENV: &str = "EVENTDB_ACCESS_TOKEN";

/// `submit-events` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "submit-events",
    about = "Fetch provider events by id, classify them, and print them as JSON lines",
    version
)]
struct CliArgs {
    /// Provider event id; repeat for a batch.
    #[arg(long = "event-id", value_name = "id", required = true, value_parser = parse_event_id)]
    event_ids: Vec<EventId>,
    /// User lending the access token.
    #[arg(long = "owner", value_name = "user", default_value = "cli")]
    owner: String,
    /// Provider access token. Falls back to `EVENTDB_ACCESS_TOKEN` when omitted.
    #[arg(long = "token", value_name = "token")]
    token: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = EventdbSettings::load_from_iter([OsString::from("submit-events")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let owner = UserId::new(&args.owner)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let token = resolve_token(args.token)?;

    let endpoint = settings
        .graph_endpoint()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
    let source = GraphHttpEventSource::new(endpoint, settings.graph_timeout())
        .map_err(|error| io::Error::other(format!("create provider client: {error}")))?;

    let store = Arc::new(InMemoryCandidateStore::new(Arc::new(DefaultClock)));
    store
        .insert_user(User::new(owner.clone()).with_token(token))
        .map_err(|error| io::Error::other(error.to_string()))?;

    let service = IngestionService::new(
        IngestionPorts::new(Arc::new(source), store.clone(), store.clone()),
        settings.ingestion_config(),
    );
    let ctx = RequestContext::new(Actor::user(owner));
    let summary = service
        .submit(&ctx, &args.event_ids)
        .await
        .map_err(|error| io::Error::other(format!("submit failed: {error}")))?;
    info!(
        attempts = summary.attempts,
        stored = summary.stored,
        flagged = summary.flagged,
        "submission finished"
    );

    let events = store
        .get_multi(&args.event_ids)
        .await
        .map_err(|error| io::Error::other(error.to_string()))?;
    let mut stdout = io::stdout().lock();
    for event in &events {
        let line = serde_json::to_string(event).map_err(io::Error::other)?;
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}

fn parse_event_id(raw: &str) -> Result<EventId, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("event id must not be empty".to_owned());
    }
    Ok(EventId::new(trimmed))
}

fn resolve_token(explicit: Option<String>) -> io::Result<AccessToken> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--token must not be empty when provided",
            ));
        }
        return Ok(AccessToken::new(value));
    }

    let from_env = env::var(TOKEN_ENV).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "access token missing: set --token or EVENTDB_ACCESS_TOKEN",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "EVENTDB_ACCESS_TOKEN must not be empty",
        ));
    }
    Ok(AccessToken::new(from_env))
}
