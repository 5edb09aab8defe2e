//! Resource collections against a mocked legacy backend.

#![allow(clippy::unwrap_used)]

use chimax_admin::notify::Level;
use chimax_admin::resource::{ListPhase, ListQuery, ResourceCollection, ResourceError};
use chimax_core::EntityId;
use chimax_core::entities::{CoinPlan, Hashtag, ReportReason};
use chimax_integration_tests::Operator;
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn test_empty_report_reason_list_is_ready() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/reportReason"))
        .and(query_param("start", "1"))
        .and(query_param("limit", "20"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": true, "data": []})),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut reasons =
        ResourceCollection::<ReportReason>::new(operator.api.clone(), operator.notifier.clone());
    reasons.fetch(ListQuery::default()).await.unwrap();

    let state = reasons.state();
    assert!(state.items.is_empty());
    assert_eq!(state.total, 0);
    assert!(!state.loading);
    assert!(!state.initial_loading);
    assert_eq!(state.phase(), ListPhase::Ready);
}

#[tokio::test]
async fn test_first_fetch_failure_offers_retry() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": false, "message": "Database unavailable"})),
        )
        .up_to_n_times(1)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "h1", "tag": "#sun"}],
            "total": 1
        })))
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut hashtags =
        ResourceCollection::<Hashtag>::new(operator.api.clone(), operator.notifier.clone());

    assert!(hashtags.fetch(ListQuery::default()).await.is_err());
    assert_eq!(
        hashtags.state().phase(),
        ListPhase::InitialFailed("Database unavailable".to_string())
    );

    hashtags.retry().await.unwrap();
    assert_eq!(hashtags.state().phase(), ListPhase::Ready);
    assert_eq!(hashtags.state().items.len(), 1);

    let toasts = operator.feed.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, Level::Error);
}

#[tokio::test]
async fn test_created_hashtag_is_listed_once() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "h1", "tag": "#moon"}],
            "total": 1
        })))
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/hashtag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {"_id": "h2", "tag": "#sun"}
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut hashtags =
        ResourceCollection::<Hashtag>::new(operator.api.clone(), operator.notifier.clone());
    hashtags.fetch(ListQuery::default()).await.unwrap();

    let created = hashtags
        .create(object(json!({"tag": "#sun"})))
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "h2");

    let state = hashtags.state();
    assert_eq!(state.total, 2);
    let ids: Vec<&str> = state.items.iter().map(|tag| tag.id.as_str()).collect();
    assert_eq!(ids, ["h2", "h1"]);

    let toasts = operator.feed.drain();
    assert_eq!(toasts.last().unwrap().message, "Hashtag created");
}

#[tokio::test]
async fn test_invalid_create_never_reaches_backend() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut hashtags =
        ResourceCollection::<Hashtag>::new(operator.api.clone(), operator.notifier.clone());

    let err = hashtags.create(object(json!({"tag": ""}))).await.unwrap_err();
    match err {
        ResourceError::Validation(errors) => {
            assert!(errors.errors().iter().any(|error| error.field == "tag"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_delete_leaves_list_unchanged() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/coinplan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [
                {"_id": "p1", "coin": 100, "amount": "0.99"},
                {"_id": "p2", "coin": 500, "amount": "4.99"}
            ],
            "total": 2
        })))
        .mount(&backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/coinplan/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": false, "message": "not found"})),
        )
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();
    let before = plans.state().items.clone();

    let err = plans.delete(&EntityId::new("p1")).await.unwrap_err();
    assert_eq!(err.to_string(), "not found");
    assert_eq!(plans.state().items, before);
    assert_eq!(plans.state().total, 2);
    assert_eq!(plans.state().error.as_deref(), Some("not found"));

    let toasts = operator.feed.drain();
    assert_eq!(toasts.last().unwrap().level, Level::Error);
    assert_eq!(toasts.last().unwrap().message, "not found");
}

#[tokio::test]
async fn test_toggle_twice_restores_flag() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/coinplan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "p1", "coin": 100, "amount": "0.99", "isActive": true}]
        })))
        .mount(&backend)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/coinplan/p1/toggle/isActive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(2)
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();
    let original = plans.state().items.clone();

    let id = EntityId::new("p1");
    plans.toggle(&id, "isActive").await.unwrap();
    assert!(!plans.state().items[0].is_active);

    plans.toggle(&id, "isActive").await.unwrap();
    assert_eq!(plans.state().items, original);
}

#[tokio::test]
async fn test_load_more_skips_ids_already_listed() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "h1", "tag": "#a"}, {"_id": "h2", "tag": "#b"}],
            "total": 3
        })))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .and(query_param("start", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "h2", "tag": "#b"}, {"_id": "h3", "tag": "#c"}],
            "total": 3
        })))
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut hashtags =
        ResourceCollection::<Hashtag>::new(operator.api.clone(), operator.notifier.clone());
    hashtags
        .fetch(ListQuery {
            page_size: 2,
            ..ListQuery::default()
        })
        .await
        .unwrap();
    hashtags.load_more().await.unwrap();

    let ids: Vec<&str> = hashtags
        .state()
        .items
        .iter()
        .map(|tag| tag.id.as_str())
        .collect();
    assert_eq!(ids, ["h1", "h2", "h3"]);
    assert_eq!(hashtags.state().page, 2);
    assert!(!hashtags.state().has_more());
}

async fn mount_coin_plans(backend: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/coinplan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [
                {"_id": "p1", "coin": 100, "amount": "0.99", "productKey": "coins_100"},
                {"_id": "p2", "coin": 500, "amount": "4.99", "productKey": "coins_500"}
            ],
            "total": 2
        })))
        .mount(backend)
        .await;
}

fn ids(plans: &ResourceCollection<CoinPlan>) -> Vec<String> {
    plans
        .state()
        .items
        .iter()
        .map(|plan| plan.id.as_str().to_string())
        .collect()
}

#[tokio::test]
async fn test_update_replaces_item_in_place() {
    let backend = MockServer::start().await;
    mount_coin_plans(&backend).await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/coinplan/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {"_id": "p1", "coin": 150, "amount": "1.49", "productKey": "coins_150"}
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();

    plans
        .update(&EntityId::new("p1"), object(json!({"coin": 150})))
        .await
        .unwrap();

    assert_eq!(ids(&plans), ["p1", "p2"]);
    assert_eq!(plans.state().items[0].coin, 150);
    assert_eq!(plans.state().items[0].product_key.as_deref(), Some("coins_150"));
    assert_eq!(plans.state().items[1].coin, 500);
    assert_eq!(plans.state().total, 2);
    assert!(!plans.state().loading);

    let toasts = operator.feed.drain();
    assert_eq!(toasts.last().unwrap().level, Level::Success);
    assert_eq!(toasts.last().unwrap().message, "Coin plan updated");
}

#[tokio::test]
async fn test_update_without_echo_merges_patch() {
    let backend = MockServer::start().await;
    mount_coin_plans(&backend).await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/coinplan/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();

    plans
        .update(&EntityId::new("p2"), object(json!({"coin": 750})))
        .await
        .unwrap();

    assert_eq!(ids(&plans), ["p1", "p2"]);
    let merged = &plans.state().items[1];
    assert_eq!(merged.coin, 750);
    assert_eq!(merged.product_key.as_deref(), Some("coins_500"));
    assert_eq!(merged.amount.to_string(), "4.99");
    assert_eq!(plans.state().items[0].coin, 100);
}

#[tokio::test]
async fn test_failed_update_leaves_list_unchanged() {
    let backend = MockServer::start().await;
    mount_coin_plans(&backend).await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/coinplan/p1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": false, "message": "Plan is locked"})),
        )
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();
    let before = plans.state().items.clone();

    let err = plans
        .update(&EntityId::new("p1"), object(json!({"coin": 150})))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Plan is locked");
    assert_eq!(plans.state().items, before);
    assert_eq!(plans.state().error.as_deref(), Some("Plan is locked"));
    assert!(!plans.state().loading);
    let toasts = operator.feed.drain();
    assert_eq!(toasts.last().unwrap().level, Level::Error);
}

#[tokio::test]
async fn test_delete_removes_item_and_decrements_total() {
    let backend = MockServer::start().await;
    mount_coin_plans(&backend).await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/coinplan/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();

    plans.delete(&EntityId::new("p2")).await.unwrap();

    assert_eq!(ids(&plans), ["p1"]);
    assert_eq!(plans.state().total, 1);
    let toasts = operator.feed.drain();
    assert_eq!(toasts.last().unwrap().message, "Coin plan deleted");
}

#[tokio::test]
async fn test_toggle_toast_names_field_and_new_value() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/coinplan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "p1", "coin": 100, "amount": "0.99", "isActive": true}]
        })))
        .mount(&backend)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/admin/coinplan/p1/toggle/isActive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .mount(&backend)
        .await;

    let mut operator = Operator::signed_in(&backend, "token");
    let mut plans =
        ResourceCollection::<CoinPlan>::new(operator.api.clone(), operator.notifier.clone());
    plans.fetch(ListQuery::default()).await.unwrap();
    operator.feed.drain();

    let id = EntityId::new("p1");
    plans.toggle(&id, "isActive").await.unwrap();
    plans.toggle(&id, "isActive").await.unwrap();

    let messages: Vec<String> = operator
        .feed
        .drain()
        .into_iter()
        .map(|toast| toast.message)
        .collect();
    assert_eq!(
        messages,
        ["Coin plan isActive turned off", "Coin plan isActive turned on"]
    );
}

#[tokio::test]
async fn test_crafted_id_never_leaves_resource_path() {
    let backend = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(0)
        .mount(&backend)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(0)
        .mount(&backend)
        .await;

    let operator = Operator::signed_in(&backend, "token");
    let mut hashtags =
        ResourceCollection::<Hashtag>::new(operator.api.clone(), operator.notifier.clone());

    for crafted in ["../coinplan/p1", "h1/../../coinplan/p1", "h1?status=all", "h1#x"] {
        let id = EntityId::new(crafted);
        let err = hashtags.delete(&id).await.unwrap_err();
        assert!(matches!(err, ResourceError::Validation(_)), "{crafted}: {err}");
        let err = hashtags
            .update(&id, object(json!({"tag": "#moon"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Validation(_)), "{crafted}: {err}");
    }
    assert!(!hashtags.state().loading);
}
