//! Behavioural tests for event ingestion against the in-memory store.
use std::sync::Arc;

use chrono::TimeDelta;
use eventdb::domain::ports::{EventRepository, EventSourceError};
use eventdb::domain::{
    AccessToken, Actor, DestinationService, ErrorKind, EventId, GenerateRequest, GenerateResult,
    IngestionConfig, IngestionPorts, IngestionRuntime, IngestionService, RawEvent,
    RequestContext, RequestedUser, User, UserId,
};
use eventdb::outbound::memory::InMemoryCandidateStore;
use eventdb::test_support::clock::MutableClock;
use eventdb::test_support::events::{berlin, fixed_now, raw_event};
use eventdb::test_support::ingestion::{ImmediateSleeper, NoJitter, ScriptedEventSource};
use rstest::{fixture, rstest};

struct World {
    clock: Arc<MutableClock>,
    store: Arc<InMemoryCandidateStore>,
}

impl World {
    fn lend(&self, user: &str, token: &str) {
        self.store
            .insert_user(User::new(user_id(user)).with_token(AccessToken::new(token)))
            .expect("insert user");
    }

    fn ingestion(&self, source: Arc<ScriptedEventSource>) -> IngestionService {
        IngestionService::with_runtime(
            IngestionPorts::new(source, self.store.clone(), self.store.clone()),
            IngestionRuntime {
                sleeper: Arc::new(ImmediateSleeper),
                jitter: Arc::new(NoJitter),
            },
            IngestionConfig::default(),
        )
    }

    fn has_credential(&self, user: &str) -> bool {
        self.store
            .user(&user_id(user))
            .expect("user exists")
            .has_credential()
    }
}

fn user_id(raw: &str) -> UserId {
    UserId::new(raw).expect("valid id")
}

fn ctx() -> RequestContext {
    RequestContext::new(Actor::user(user_id("submitter")))
}

fn ids(raw: &[&str]) -> Vec<EventId> {
    raw.iter().map(|id| EventId::new(*id)).collect()
}

fn soon(id: &str) -> RawEvent {
    raw_event(id, fixed_now() + TimeDelta::minutes(30)).build()
}

#[fixture]
fn world() -> World {
    let clock = Arc::new(MutableClock::new(fixed_now()));
    World {
        store: Arc::new(InMemoryCandidateStore::new(clock.clone())),
        clock,
    }
}

#[rstest]
#[tokio::test]
async fn expired_credential_is_cleared_and_the_other_one_used(world: World) {
    world.lend("ana", "token-ana");
    world.lend("ben", "token-ben");
    let source = Arc::new(ScriptedEventSource::new(vec![
        Err(EventSourceError::credential_expired("token expired")),
        Ok(vec![soon("1")]),
    ]));

    let summary = world
        .ingestion(source.clone())
        .submit(&ctx(), &ids(&["1"]))
        .await
        .expect("second attempt succeeds");

    assert_eq!(summary.attempts, 2);
    let tokens = source.tokens();
    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1]);
    let expired_owner = tokens[0].trim_start_matches("token-");
    let valid_owner = tokens[1].trim_start_matches("token-");
    assert!(!world.has_credential(expired_owner));
    assert!(world.has_credential(valid_owner));
    world
        .store
        .get_by_id(&EventId::new("1"))
        .await
        .expect("event stored");
}

#[rstest]
#[tokio::test]
async fn oversized_batches_never_reach_the_source(world: World) {
    world.lend("ana", "token-ana");
    let source = Arc::new(ScriptedEventSource::new(Vec::new()));
    let batch: Vec<EventId> = (0..51).map(|n| EventId::new(n.to_string())).collect();

    let err = world
        .ingestion(source.clone())
        .submit(&ctx(), &batch)
        .await
        .expect_err("batch too large");

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert_eq!(source.call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn no_lendable_credential_fails_without_fetching(world: World) {
    let source = Arc::new(ScriptedEventSource::new(Vec::new()));

    let err = world
        .ingestion(source.clone())
        .submit(&ctx(), &ids(&["1"]))
        .await
        .expect_err("no credential");

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(source.call_count(), 0);
}

#[rstest]
#[tokio::test]
async fn ingested_events_feed_selection_and_bad_ones_are_hidden(world: World) {
    world.lend("ana", "token-ana");
    let sold_out = raw_event("2", fixed_now() + TimeDelta::minutes(30))
        .name("SOLD OUT: rooftop concert")
        .build();
    let priced = raw_event("3", fixed_now() + TimeDelta::minutes(30))
        .description("Tickets 15€ at the door")
        .build();
    let source = Arc::new(ScriptedEventSource::new(vec![Ok(vec![
        soon("1"),
        sold_out,
        priced,
    ])]));

    let summary = world
        .ingestion(source)
        .submit(&ctx(), &ids(&["1", "2", "3"]))
        .await
        .expect("ingested");
    assert_eq!((summary.stored, summary.flagged), (3, 2));

    let selection = DestinationService::new(
        world.store.clone(),
        world.store.clone(),
        world.clock.clone(),
    );
    let reply = selection
        .generate_next(
            &RequestContext::new(Actor::user(user_id("visitor"))),
            GenerateRequest::new(RequestedUser::Me, berlin()),
        )
        .await
        .expect("selection");

    assert_eq!(reply.result, GenerateResult::Ok);
    let chosen = reply.destination.expect("destination");
    assert_eq!(chosen.event_id().as_ref(), "1");
}

#[rstest]
#[tokio::test]
async fn rejected_requests_fail_after_one_attempt(world: World) {
    world.lend("ana", "token-ana");
    let source = Arc::new(ScriptedEventSource::new(vec![Err(
        EventSourceError::rejected("status 400: unsupported request"),
    )]));

    let err = world
        .ingestion(source.clone())
        .submit(&ctx(), &ids(&["1"]))
        .await
        .expect_err("rejected");

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(source.call_count(), 1);
    assert!(world.has_credential("ana"));
}
