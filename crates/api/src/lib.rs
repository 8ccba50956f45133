mod config;
mod rate_limit;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Json, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use serde::Serialize;
use smartpay_core::{IntentClassifier, IntentRequest, RuleIntentClassifier};
use smartpay_observability::{AppMetrics, MetricsSnapshot};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

pub use config::{ApiConfig, ConfigError};
pub use rate_limit::IpRateLimiter;

const SERVICE_NAME: &str = "smartpay-intent";

#[derive(Clone)]
pub struct ApiState {
    pub classifier: Arc<dyn IntentClassifier>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
    pub max_body_bytes: usize,
}

impl ApiState {
    pub fn new(config: &ApiConfig, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            classifier,
            metrics: AppMetrics::shared(),
            limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    classifier: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

/// Router backed by the rule classifier.
pub fn build_app(config: &ApiConfig) -> Router {
    let state = ApiState::new(config, Arc::new(RuleIntentClassifier));
    build_router(state)
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/intent", post(classify))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        classifier: state.classifier.name(),
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

#[instrument(skip_all)]
async fn classify(
    State(state): State<ApiState>,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    state.metrics.inc_request();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.metrics.inc_rejected();
            warn!(status = %rejection.status(), "rejected intent request");
            return (
                rejection.status(),
                Json(serde_json::json!({
                    "error": "invalid_request",
                    "message": rejection.body_text()
                })),
            )
                .into_response();
        }
    };

    let classification = state.classifier.classify(&request.text);
    let intent = classification.intent();
    state.metrics.record_intent(intent);
    state.metrics.observe_latency(started.elapsed());

    info!(
        intent = intent.as_label(),
        classifier = state.classifier.name(),
        text_len = request.text.len(),
        "classified message"
    );

    (StatusCode::OK, Json(classification)).into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        state.metrics.inc_rejected();
        warn!(ip = %ip, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}
