use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    cors::{cors_layer, origin_gate, OriginPolicy},
    error::GatewayError,
    gateway::ImageGateway,
    models::{GenerationResult, HealthStatus},
};

/// Cap on the JSON request body.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ImageGateway>,
}

pub async fn generate_images(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerationResult>, Response> {
    let raw = match body {
        Ok(Json(v)) => v,
        // Unparseable or non-JSON bodies are treated like `{}`.
        Err(JsonRejection::JsonSyntaxError(_))
        | Err(JsonRejection::JsonDataError(_))
        | Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        // Oversized or unreadable bodies keep their own status (413 for the limit).
        Err(rejection) => return Err(rejection.into_response()),
    };
    state
        .gateway
        .generate(&raw)
        .await
        .map(Json)
        .map_err(GatewayError::into_response)
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

pub fn create_app(state: AppState, policy: Arc<OriginPolicy>) -> Router {
    Router::new()
        .route("/images/generate", post(generate_images))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(policy.clone()))
                .layer(middleware::from_fn_with_state(policy, origin_gate))
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}
