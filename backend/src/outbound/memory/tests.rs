//! Behaviour of the in-memory candidate store.

use super::*;
use crate::domain::{AccessToken, Coordinates, Region};
use crate::test_support::clock::MutableClock;
use crate::test_support::events::{berlin, fixed_now, raw_event};
use chrono::{DateTime, TimeDelta, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn store() -> InMemoryCandidateStore {
    InMemoryCandidateStore::new(Arc::new(MutableClock::new(fixed_now())))
}

fn window(start: DateTime<Utc>, hours: i64) -> EventSearch {
    EventSearch {
        region: Region::circle(berlin(), 8000.0),
        start,
        end: start + TimeDelta::hours(hours),
        include_bad: false,
    }
}

fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|event| event.id.as_ref()).collect()
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid id")
}

#[rstest]
#[tokio::test]
async fn search_orders_by_start_and_applies_filters(store: InMemoryCandidateStore) {
    let now = fixed_now();
    let far_away = Coordinates::new(48.1374, 11.5755).expect("munich");
    for raw in [
        raw_event("late", now + TimeDelta::hours(2)).build(),
        raw_event("early", now).build(),
        raw_event("no-street", now).without_street().build(),
        raw_event("marathon", now).lasting(TimeDelta::hours(12)).build(),
        raw_event("munich", now)
            .at(far_away.latitude(), far_away.longitude())
            .build(),
        raw_event("tomorrow", now + TimeDelta::days(1)).build(),
    ] {
        store.upsert(&raw).await.expect("stored");
    }

    let found = store.search(&window(now, 4)).await.expect("search");
    assert_eq!(ids(&found), vec!["early", "late"]);
}

#[rstest]
#[tokio::test]
async fn bad_events_are_hidden_unless_requested(store: InMemoryCandidateStore) {
    let raw = raw_event("flagged", fixed_now()).build();
    store.upsert(&raw).await.expect("stored");
    store
        .set_bad(&EventId::new("flagged"), true)
        .await
        .expect("flagged");

    let mut search = window(fixed_now(), 2);
    assert!(store.search(&search).await.expect("search").is_empty());
    search.include_bad = true;
    assert_eq!(ids(&store.search(&search).await.expect("search")), vec!["flagged"]);
}

#[rstest]
#[tokio::test]
async fn upsert_replaces_fields_but_keeps_the_bad_flag(store: InMemoryCandidateStore) {
    store
        .upsert(&raw_event("1", fixed_now()).name("Before").build())
        .await
        .expect("stored");
    store.set_bad(&EventId::new("1"), true).await.expect("flagged");

    let updated = store
        .upsert(&raw_event("1", fixed_now()).name("After").build())
        .await
        .expect("updated");

    assert_eq!(updated.name, "After");
    assert!(updated.is_bad);
    let raw = store.raw_event(&EventId::new("1")).expect("raw kept");
    assert_eq!(raw.as_json()["name"], "After");
}

#[rstest]
#[tokio::test]
async fn undecodable_bodies_are_rejected(store: InMemoryCandidateStore) {
    let raw = RawEvent::new(serde_json::json!({ "id": "1" }));
    let err = store.upsert(&raw).await.expect_err("no start time");
    assert!(matches!(err, CandidateStoreError::InvalidRecord { .. }));
}

#[rstest]
#[tokio::test]
async fn unknown_records_are_not_found(store: InMemoryCandidateStore) {
    let id = EventId::new("missing");
    assert!(matches!(
        store.get_by_id(&id).await,
        Err(CandidateStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.set_bad(&id, true).await,
        Err(CandidateStoreError::NotFound { .. })
    ));
    assert!(matches!(
        DestinationRepository::get(&store, &DestinationId::new("nope")).await,
        Err(CandidateStoreError::NotFound { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn get_multi_skips_missing_ids(store: InMemoryCandidateStore) {
    store
        .upsert(&raw_event("a", fixed_now()).build())
        .await
        .expect("stored");
    let found = store
        .get_multi(&[EventId::new("a"), EventId::new("gone")])
        .await
        .expect("lookup");
    assert_eq!(ids(&found), vec!["a"]);
}

#[rstest]
#[tokio::test]
async fn history_is_newest_first_and_paged(store: InMemoryCandidateStore) {
    let alice = user("alice");
    for n in 0..12 {
        store
            .create(&NewDestination {
                user_id: alice.clone(),
                event_id: EventId::new(n.to_string()),
            })
            .await
            .expect("created");
    }
    store
        .create(&NewDestination {
            user_id: user("bob"),
            event_id: EventId::new("b"),
        })
        .await
        .expect("created");

    let first = store.list_for_user(&alice, 0).await.expect("page 0");
    let second = store.list_for_user(&alice, 1).await.expect("page 1");

    assert_eq!(first.len(), HISTORY_PAGE_SIZE);
    assert_eq!(first.first().map(|d| d.event_id().as_ref()), Some("11"));
    let rest: Vec<&str> = second.iter().map(|d| d.event_id().as_ref()).collect();
    assert_eq!(rest, vec!["1", "0"]);
}

#[rstest]
#[tokio::test]
async fn updates_change_status_and_feedback(store: InMemoryCandidateStore) {
    let created = store
        .create(&NewDestination {
            user_id: user("alice"),
            event_id: EventId::new("1"),
        })
        .await
        .expect("created");
    assert_eq!(created.created_at(), fixed_now());

    let updated = store
        .update(
            created.id(),
            &DestinationUpdate {
                status: Some("visited".to_owned()),
                feedback: None,
            },
        )
        .await
        .expect("updated");
    assert_eq!(updated.status(), "visited");

    let reread = DestinationRepository::get(&store, created.id())
        .await
        .expect("reread");
    assert_eq!(reread.status(), "visited");
}

#[rstest]
#[tokio::test]
async fn credentials_come_from_users_holding_tokens(store: InMemoryCandidateStore) {
    store
        .insert_user(User::new(user("empty")))
        .expect("inserted");
    store
        .insert_user(User::new(user("holder")).with_token(AccessToken::new("secret")))
        .expect("inserted");

    let credential = store.random_credential().await.expect("credential");
    assert_eq!(credential.owner, user("holder"));
    assert_eq!(credential.token.expose(), "secret");

    store
        .clear_credential(&user("holder"))
        .await
        .expect("cleared");
    assert!(!store.user(&user("holder")).expect("user").has_credential());
    assert!(matches!(
        store.random_credential().await,
        Err(CandidateStoreError::NotFound { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn clearing_an_unknown_user_fails(store: InMemoryCandidateStore) {
    assert!(matches!(
        store.clear_credential(&user("ghost")).await,
        Err(CandidateStoreError::NotFound { .. })
    ));
}
