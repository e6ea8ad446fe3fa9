//! Ordering tests for overlapping searches.
//!
//! Responses are reordered with per-call delays on the mock service; only
//! the newest issued search may ever be published.

use std::sync::Arc;
use std::time::Duration;

use fetchmate_core::{
    testing::{fixtures, ApiOperation, MockDogApi},
    DogApiError, SearchController, SearchCriteria, SearchOutcome,
};

async fn catalog() -> Arc<MockDogApi> {
    let api = Arc::new(MockDogApi::new());
    api.set_dogs(fixtures::dogs(30, "Beagle")).await;
    api.add_dogs(fixtures::dogs(30, "Pug")).await;
    api.add_dogs(fixtures::dogs(30, "Boxer")).await;
    api
}

#[tokio::test]
async fn test_older_ids_response_arriving_last_is_dropped() {
    let api = catalog().await;
    let controller = SearchController::new(api.clone());
    api.push_delay(ApiOperation::Search, Duration::from_millis(60))
        .await;

    let r1 = controller.update_criteria(SearchCriteria::with_breeds(["Beagle"]));
    let r2 = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller
            .update_criteria(SearchCriteria::with_breeds(["Pug"]))
            .await
    };
    let (r1, r2) = futures::join!(r1, r2);

    assert_eq!(r1.unwrap(), SearchOutcome::Superseded { seq: 1 });
    assert!(r2.unwrap().is_applied());

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.seq, 2);
    assert!(snapshot.records.iter().all(|d| d.breed == "Pug"));
}

#[tokio::test]
async fn test_older_bodies_response_arriving_last_is_dropped() {
    let api = catalog().await;
    let controller = SearchController::new(api.clone());
    // R1's id search is quick but its body fetch is slow.
    api.push_delay(ApiOperation::FetchDogs, Duration::from_millis(60))
        .await;

    let r1 = controller.update_criteria(SearchCriteria::with_breeds(["Beagle"]));
    let r2 = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller
            .update_criteria(SearchCriteria::with_breeds(["Boxer"]))
            .await
    };
    let (r1, r2) = futures::join!(r1, r2);

    assert!(matches!(r1.unwrap(), SearchOutcome::Superseded { .. }));
    assert!(r2.unwrap().is_applied());
    let snapshot = controller.snapshot().await;
    assert!(snapshot.records.iter().all(|d| d.breed == "Boxer"));
    assert_eq!(snapshot.criteria.breeds(), ["Boxer"]);
}

#[tokio::test]
async fn test_newer_response_arriving_last_is_kept() {
    let api = catalog().await;
    let controller = SearchController::new(api.clone());
    api.push_delay(ApiOperation::Search, Duration::ZERO).await;
    api.push_delay(ApiOperation::Search, Duration::from_millis(30))
        .await;

    let r1 = controller.update_criteria(SearchCriteria::with_breeds(["Beagle"]));
    let r2 = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        controller
            .update_criteria(SearchCriteria::with_breeds(["Pug"]))
            .await
    };
    let (r1, r2) = futures::join!(r1, r2);

    // R1 completed before R2 was issued, so both are published in turn.
    assert!(r1.unwrap().is_applied());
    assert!(r2.unwrap().is_applied());
    let snapshot = controller.snapshot().await;
    assert!(snapshot.records.iter().all(|d| d.breed == "Pug"));
}

#[tokio::test]
async fn test_superseded_failure_is_not_reported() {
    let api = catalog().await;
    let controller = SearchController::new(api.clone());
    api.push_delay(ApiOperation::Search, Duration::from_millis(40))
        .await;
    api.push_error(
        ApiOperation::Search,
        DogApiError::ApiError {
            status: 500,
            message: "boom".to_string(),
        },
    )
    .await;

    let r1 = controller.apply_filters();
    let r2 = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        controller.apply_filters().await
    };
    let (r1, r2) = futures::join!(r1, r2);

    assert_eq!(r1.unwrap(), SearchOutcome::Superseded { seq: 1 });
    assert!(r2.unwrap().is_applied());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn test_rapid_page_clicks_land_on_last_click() {
    let api = Arc::new(MockDogApi::new());
    api.set_dogs(fixtures::dogs(400, "Beagle")).await;
    let controller = SearchController::new(api.clone());
    controller.apply_filters().await.unwrap();

    api.push_delay(ApiOperation::Search, Duration::from_millis(50))
        .await;
    api.push_delay(ApiOperation::Search, Duration::from_millis(30))
        .await;

    let click_3 = controller.go_to_page(3);
    let click_5 = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        controller.go_to_page(5).await
    };
    let click_7 = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.go_to_page(7).await
    };
    let (a, b, c) = futures::join!(click_3, click_5, click_7);

    assert!(!a.unwrap().is_applied());
    assert!(!b.unwrap().is_applied());
    assert!(c.unwrap().is_applied());
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.page, 7);
    assert_eq!(snapshot.records[0].id, "beagle-240");
}
