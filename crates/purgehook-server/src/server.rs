use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use purgehook_dispatch::InvalidationDispatcher;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Header the origin sets when content changed
pub const INVALIDATION_HEADER: &str = "x-cache-invalidate";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: InvalidationDispatcher,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub pattern: Option<String>,
}

pub fn build_app(dispatcher: InvalidationDispatcher) -> Router {
    Router::new()
        .route("/invalidate", post(invalidate))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { dispatcher })
}

async fn invalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let from_header = headers
        .get(INVALIDATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let pattern = from_header.or_else(|| {
        serde_json::from_slice::<InvalidateRequest>(&body)
            .ok()
            .and_then(|req| req.pattern)
    });

    match pattern {
        Some(pattern) => {
            state.dispatcher.schedule(pattern.clone());
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "scheduled", "pattern": pattern })),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("missing {INVALIDATION_HEADER} header or pattern field")
            })),
        ),
    }
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "pending": state.dispatcher.has_pending(),
    }))
}
