//! Session lifecycle integration tests.
//!
//! These tests drive a full session against the mock service and a
//! file-backed store: start -> browse -> favorite -> match -> start over.

use std::sync::Arc;

use tempfile::TempDir;

use fetchmate_core::{
    testing::{fixtures, ApiOperation, MockDogApi, RecordedApiCall},
    DogRecord, KeyValueStorage, SearchCriteria, Session, SessionNotice, SessionState, SqliteStorage,
};

/// Test helper owning the mock service and the database directory.
struct TestHarness {
    api: Arc<MockDogApi>,
    temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let api = Arc::new(MockDogApi::new());
        api.set_breeds(vec![
            "Beagle".to_string(),
            "Boxer".to_string(),
            "Pug".to_string(),
        ])
        .await;
        api.set_dogs(fixtures::dogs(85, "Beagle")).await;
        api.add_dogs(fixtures::dogs(12, "Pug")).await;

        Self { api, temp_dir }
    }

    /// Open a session on the harness database, as a page reload would.
    fn open_session(&self) -> Session {
        let db_path = self.temp_dir.path().join("fetchmate.db");
        let storage =
            Arc::new(SqliteStorage::new(&db_path).expect("Failed to open storage"));
        Session::new(self.api.clone(), storage, "favorites")
    }
}

#[tokio::test]
async fn test_beagle_search_scenario() {
    let harness = TestHarness::new().await;
    let session = harness.open_session();
    session.start().await.unwrap();

    session
        .update_criteria(SearchCriteria::with_breeds(["Beagle"]))
        .await
        .unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status_line(), "Found 85 dogs");
    assert_eq!(snapshot.records.len(), 40);
    assert!(snapshot.records.iter().all(|d| d.breed == "Beagle"));

    let view = session.pagination().await.unwrap();
    assert!(view.next_enabled);
    assert!(!view.prev_enabled);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.range_label(), "Showing dogs 1 to 40 of 85");

    let searches = harness.api.recorded_searches().await;
    let last = searches.last().unwrap();
    assert_eq!(last.breeds, vec!["Beagle"]);
    assert_eq!(last.sort.to_string(), "breed:asc");
    assert_eq!(last.size, 40);
}

#[tokio::test]
async fn test_walk_every_page() {
    let harness = TestHarness::new().await;
    let session = harness.open_session();
    session
        .update_criteria(SearchCriteria::with_breeds(["Beagle"]))
        .await
        .unwrap();

    let mut seen: Vec<DogRecord> = session.snapshot().await.records;
    while session.snapshot().await.has_next() {
        session.next_page().await.unwrap();
        seen.extend(session.snapshot().await.records);
    }

    assert_eq!(seen.len(), 85);
    assert_eq!(session.snapshot().await.page, 3);
    let view = session.pagination().await.unwrap();
    assert_eq!(view.range_label(), "Showing dogs 81 to 85 of 85");
    assert!(!view.next_enabled);

    session.prev_page().await.unwrap();
    assert_eq!(session.snapshot().await.page, 2);
}

#[tokio::test]
async fn test_favorites_survive_reload() {
    let harness = TestHarness::new().await;
    let picked: Vec<DogRecord>;

    {
        let session = harness.open_session();
        session.start().await.unwrap();
        let records = session.snapshot().await.records;
        picked = vec![records[4].clone(), records[1].clone(), records[7].clone()];
        for record in &picked {
            session.toggle_favorite(record).await;
        }
    }

    let session = harness.open_session();
    assert_eq!(session.favorites().await, picked);
}

#[tokio::test]
async fn test_full_match_lifecycle() {
    let harness = TestHarness::new().await;
    let session = harness.open_session();
    let mut notices = session.subscribe();
    session.start().await.unwrap();

    let records = session.snapshot().await.records;
    let a = records[0].clone();
    let b = records[1].clone();
    session.toggle_favorite(&a).await;
    session.toggle_favorite(&b).await;
    harness.api.set_match(b.id.clone()).await;

    session.open_favorites().await.unwrap();
    assert_eq!(session.state().await, SessionState::ViewingFavorites);

    let matched = session.generate_match().await.unwrap();
    assert_eq!(matched, Some(b.clone()));
    assert_eq!(session.state().await, SessionState::MatchShown);

    let match_calls: Vec<RecordedApiCall> = harness
        .api
        .recorded_calls()
        .await
        .into_iter()
        .filter(|c| c.operation() == ApiOperation::Match)
        .collect();
    assert_eq!(
        match_calls,
        vec![RecordedApiCall::Match {
            ids: vec![a.id.clone(), b.id.clone()]
        }]
    );

    session.start_over().await.unwrap();
    assert_eq!(session.state().await, SessionState::Browsing);
    assert!(session.favorites().await.is_empty());

    // Start over is persisted.
    drop(session);
    let reopened = harness.open_session();
    assert!(reopened.favorites().await.is_empty());

    let mut received = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        received.push(notice);
    }
    assert!(received.contains(&SessionNotice::MatchFound {
        id: b.id.clone(),
        name: b.name.clone(),
    }));
    assert_eq!(received.last(), Some(&SessionNotice::StartedOver));
}

#[tokio::test]
async fn test_corrupted_favorites_start_empty() {
    let harness = TestHarness::new().await;
    {
        let db_path = harness.temp_dir.path().join("fetchmate.db");
        let storage = SqliteStorage::new(&db_path).unwrap();
        storage.set("favorites", "definitely not json").unwrap();
    }

    let session = harness.open_session();
    assert!(session.favorites().await.is_empty());
    session.start().await.unwrap();
}
