//! Integration tests for collection provisioning and the create retry.
//!
//! A declared collection only exists once ensure_provisioned has run,
//! so the first add against a fresh provider exercises the self-healing
//! path end to end.

use std::sync::Arc;

use docstore::{
    DocumentRepository, Entity, RepositoryError, StoreClientProvider, StoreError,
    MAX_CREATE_ATTEMPTS,
};
use docstore_memory::{CollectionConfig, MemoryStoreProvider};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    id: String,
    name: String,
}

impl Event {
    fn named(name: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
        }
    }
}

impl Entity for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

fn events_provider() -> Arc<MemoryStoreProvider> {
    Arc::new(MemoryStoreProvider::with_collections([
        CollectionConfig::new("events"),
    ]))
}

/// **Test: First add provisions a declared collection.**
///
/// **Setup:** Provider declares `events` but nothing is provisioned.
/// **Action:** `add` one event.
/// **Expected:** The add succeeds with no visible error, exactly two
/// create attempts and one provisioning run; the event is readable
/// afterwards.
#[tokio::test]
async fn test_first_add_provisions_declared_collection() {
    let provider = events_provider();
    let repo = DocumentRepository::new(Arc::clone(&provider), "events");

    assert!(!provider.is_provisioned("events").await);

    let added = repo
        .add(Event::named("deploy"))
        .await
        .expect("Failed to add event");

    assert!(provider.is_provisioned("events").await);
    assert_eq!(
        provider.create_attempts("events").await,
        u64::from(MAX_CREATE_ATTEMPTS)
    );
    assert_eq!(provider.ensure_calls().await, 1);

    let fetched = repo
        .get_by_id(added.id())
        .await
        .expect("Failed to get event");
    assert_eq!(fetched, added);
}

/// **Test: Later adds do not provision again.**
///
/// **Setup:** Fresh provider declaring `events`.
/// **Action:** `add` twice.
/// **Expected:** Three create attempts in total (two for the healing
/// first add, one for the second) and a single provisioning run.
#[tokio::test]
async fn test_subsequent_adds_do_not_reprovision() {
    let provider = events_provider();
    let repo = DocumentRepository::new(Arc::clone(&provider), "events");

    repo.add(Event::named("first"))
        .await
        .expect("Failed to add event");
    repo.add(Event::named("second"))
        .await
        .expect("Failed to add event");

    assert_eq!(provider.create_attempts("events").await, 3);
    assert_eq!(provider.ensure_calls().await, 1);
    assert_eq!(provider.len("events").await, 2);
}

/// **Test: ensure_provisioned is idempotent.**
///
/// **Setup:** Provisioned collection holding one event.
/// **Action:** Run `ensure_provisioned` again.
/// **Expected:** The stored event survives and stays readable.
#[tokio::test]
async fn test_ensure_provisioned_is_idempotent() {
    let provider = events_provider();
    provider
        .ensure_provisioned()
        .await
        .expect("Failed to provision");
    let repo = DocumentRepository::new(Arc::clone(&provider), "events");

    let added = repo
        .add(Event::named("keep"))
        .await
        .expect("Failed to add event");

    provider
        .ensure_provisioned()
        .await
        .expect("Failed to re-provision");

    assert_eq!(provider.len("events").await, 1);
    let fetched = repo
        .get_by_id(added.id())
        .await
        .expect("Failed to get event");
    assert_eq!(fetched, added);
    assert_eq!(provider.create_attempts("events").await, 1);
}

/// **Test: Add against a collection the provider never declared.**
///
/// **Setup:** Provider declares only `events`; repository targets
/// `ghosts`.
/// **Action:** `add`.
/// **Expected:** Provisioning runs once but cannot create the
/// collection, the retry fails the same way, and the error passes
/// through as `Store(NotFound)` rather than the repository's own
/// `NotFound`.
#[tokio::test]
async fn test_add_to_undeclared_collection_is_store_error() {
    let provider = events_provider();
    let repo = DocumentRepository::new(Arc::clone(&provider), "ghosts");

    let err = repo
        .add(Event::named("lost"))
        .await
        .expect_err("add should give up");

    assert!(matches!(
        err,
        RepositoryError::Store(StoreError::NotFound(_))
    ));
    assert_eq!(
        provider.create_attempts("ghosts").await,
        u64::from(MAX_CREATE_ATTEMPTS)
    );
    assert_eq!(provider.ensure_calls().await, 1);
    assert!(!provider.is_provisioned("ghosts").await);
}

/// **Test: Reads never trigger provisioning.**
///
/// **Setup:** Provider declares `events`, nothing provisioned.
/// **Action:** `get_all`.
/// **Expected:** `NotFound` without any provisioning run.
#[tokio::test]
async fn test_reads_do_not_self_heal() {
    let provider = events_provider();
    let repo: DocumentRepository<Event, _> =
        DocumentRepository::new(Arc::clone(&provider), "events");

    let err = repo.get_all().await.expect_err("read should fail");

    assert!(matches!(err, RepositoryError::NotFound(_)));
    assert_eq!(provider.ensure_calls().await, 0);
    assert!(!provider.is_provisioned("events").await);
}
