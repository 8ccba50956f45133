use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use smartpay_api::{build_app, ApiConfig};
use tower::ServiceExt;

fn app() -> Router {
    build_app(&ApiConfig::default())
}

fn intent_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn balance_query() {
    let (status, body) = send(app(), intent_request(json!({ "text": "Check my Balance" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "intent": "CHECK_BALANCE" }));
}

#[tokio::test]
async fn send_money_with_phone() {
    let (status, body) = send(
        app(),
        intent_request(json!({ "text": "send 500 to 0712345678" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "intent": "SEND_MONEY",
            "amount": 500,
            "phone": "0712345678",
            "confidence": 0.9
        })
    );
}

#[tokio::test]
async fn withdraw_reports_null_phone() {
    let (_, body) = send(app(), intent_request(json!({ "text": "withdraw 200" }))).await;

    assert_eq!(
        body,
        json!({
            "intent": "WITHDRAW",
            "amount": 200,
            "phone": null,
            "confidence": 0.9
        })
    );
}

#[tokio::test]
async fn send_word_beats_withdraw() {
    let (_, body) = send(app(), intent_request(json!({ "text": "send 100 withdraw 50" }))).await;

    assert_eq!(body["intent"], "SEND_MONEY");
    assert_eq!(body["amount"], 100);
}

#[tokio::test]
async fn unknown_has_no_extra_fields() {
    let (status, body) = send(app(), intent_request(json!({ "text": "hello there" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "intent": "UNKNOWN" }));
}

#[tokio::test]
async fn missing_text_is_rejected_at_the_boundary() {
    let (status, body) = send(app(), intent_request(json!({ "message": "withdraw 5" }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();

    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ApiConfig {
        max_body_bytes: 64,
        ..ApiConfig::default()
    };
    let body = json!({ "text": "send 1 ".repeat(40) }).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap();

    let response = build_app(&config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["error"], "invalid_request");
}

#[tokio::test]
async fn huge_amount_is_returned_digit_for_digit() {
    let response = app()
        .oneshot(intent_request(
            json!({ "text": "withdraw 123456789012345678901234567890" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(
        raw,
        r#"{"intent":"WITHDRAW","amount":123456789012345678901234567890,"phone":null,"confidence":0.9}"#
    );
}

#[tokio::test]
async fn arabic_indic_amount_is_classified() {
    let (status, body) = send(app(), intent_request(json!({ "text": "send ٥٠٠" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "SEND_MONEY");
    assert_eq!(body["amount"], 500);
}

#[tokio::test]
async fn rate_limit_applies_per_forwarded_ip() {
    let config = ApiConfig {
        rate_limit_max: 2,
        rate_limit_window: Duration::from_secs(60),
        ..ApiConfig::default()
    };
    let app = build_app(&config);

    let request_from = |ip: &str| {
        Request::builder()
            .method("POST")
            .uri("/intent")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(json!({ "text": "withdraw 10" }).to_string()))
            .unwrap()
    };

    for _ in 0..2 {
        let (status, _) = send(app.clone(), request_from("41.90.0.1")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(app.clone(), request_from("41.90.0.1")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    let (status, _) = send(app.clone(), request_from("41.90.0.2")).await;
    assert_eq!(status, StatusCode::OK);

    let health = Request::builder()
        .uri("/health")
        .header("x-forwarded-for", "41.90.0.1")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, health).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_reports_intent_counts() {
    let app = app();

    send(app.clone(), intent_request(json!({ "text": "balance" }))).await;
    send(app.clone(), intent_request(json!({ "text": "withdraw 20" }))).await;
    send(app.clone(), intent_request(json!({ "text": "??" }))).await;

    let (status, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classifier"], "rules");
    assert_eq!(body["metrics"]["requests_total"], 3);
    assert_eq!(body["metrics"]["check_balance_total"], 1);
    assert_eq!(body["metrics"]["withdraw_total"], 1);
    assert_eq!(body["metrics"]["unknown_total"], 1);
}
