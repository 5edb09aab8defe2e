//! The HTTP console end to end: guard, sign-in, resource routes.

#![allow(clippy::unwrap_used)]

use chimax_integration_tests::{OPERATOR_EMAIL, TestConsole};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_hashtags(console: &TestConsole) {
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [{"_id": "h1", "tag": "#sun"}],
            "total": 1
        })))
        .mount(&console.backend)
        .await;
}

#[tokio::test]
async fn test_health_is_public() {
    let console = TestConsole::start().await;
    let resp = console.client.get(console.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("x-request-id").is_some());
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_protected_screen_redirects_to_login() {
    let console = TestConsole::start().await;
    let resp = console.client.get(console.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "/login?return_to=%2F"
    );
}

#[tokio::test]
async fn test_protected_api_answers_401() {
    let console = TestConsole::start().await;
    let resp = console
        .client
        .get(console.url("/api/hashtags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["redirect"], "/login?return_to=%2Fapi%2Fhashtags");
}

#[tokio::test]
async fn test_sign_in_then_list_resources() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    mount_hashtags(&console).await;

    let resp = console.sign_in().await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["state"]["user_id"], "admin-1");
    assert_eq!(body["state"]["v2_enabled"], true);
    assert_eq!(body["state"]["email"], OPERATOR_EMAIL);
    assert_eq!(body["notifications"][0]["level"], "success");

    let resp = console
        .client
        .get(console.url("/api/hashtags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["state"]["items"][0]["tag"], "#sun");
    assert_eq!(body["state"]["total"], 1);
    assert_eq!(body["access"]["can_edit"], true);

    let resp = console.client.get(console.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(entries.len(), 12);
}

#[tokio::test]
async fn test_signed_in_operator_is_sent_away_from_login() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console.sign_in().await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get("location").unwrap(), "/");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let console = TestConsole::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_PASSWORD"}
        })))
        .mount(&console.backend)
        .await;

    let resp = console.sign_in().await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["state"].is_null());
    assert_eq!(body["notifications"][0]["level"], "error");

    let resp = console.client.get(console.url("/session")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_view_only_sub_admin_cannot_create() {
    let console = TestConsole::start().await;
    console
        .mount_sign_in(
            true,
            json!([{"section": "hashtags", "canView": true, "canEdit": false}]),
        )
        .await;
    mount_hashtags(&console).await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console
        .client
        .get(console.url("/api/hashtags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = console
        .client
        .post(console.url("/api/hashtags"))
        .json(&json!({"tag": "#moon"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = console
        .client
        .get(console.url("/api/coin-plans"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_form_returns_field_errors() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console
        .client
        .post(console.url("/api/hashtags"))
        .json(&json!({"tag": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "tag");
}

#[tokio::test]
async fn test_backend_401_signs_operator_out() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/hashtag"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&console.backend)
        .await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console
        .client
        .get(console.url("/api/hashtags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = console.client.get(console.url("/session")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console.client.get(console.url("/session")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = console.client.post(console.url("/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["state"].is_null());

    let resp = console.client.get(console.url("/session")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_sign_out_during_request_clears_credentials() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    Mock::given(method("GET"))
        .and(path("/v1/support/tickets"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&console.backend)
        .await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console
        .client
        .get(console.url("/api/tickets"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["redirect"], "/login?return_to=%2Fapi%2Ftickets");

    // Nothing is left to present; the next request is turned away up front.
    let resp = console
        .client
        .get(console.url("/api/tickets"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = console.client.get(console.url("/session")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_crafted_id_is_rejected_before_backend() {
    let console = TestConsole::start().await;
    console.mount_sign_in(false, json!([])).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(0)
        .mount(&console.backend)
        .await;
    assert_eq!(console.sign_in().await.status(), StatusCode::OK);

    let resp = console
        .client
        .delete(console.url("/api/hashtags/..%2Fcoinplan%2Fp1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "id");
}
