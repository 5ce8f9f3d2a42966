//! HTTP API for reading and writing the state snapshot.
//!
//! Three routes on `/state`: GET returns the full recalculated snapshot
//! (degrading to the seed on store failure, never a 5xx), POST replaces
//! the snapshot wholesale, and OPTIONS is answered by the CORS layer for
//! browser preflight. `/sessions` proxies the upstream session provider so
//! the API key stays server-side. Requests are single-read-or-write with
//! no locking across requests; concurrent writers race and the last one
//! wins.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::sessions::{SessionsProxyConfig, SessionsProxyError, fetch_sessions};
use crate::storage::{SaveRequest, StateStore};

/// Default port for `wb serve`.
pub const DEFAULT_PORT: u16 = 3141;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Store instance (wrapped in a Mutex so handlers can write)
    pub store: Arc<Mutex<StateStore>>,
    /// Upstream session-provider settings for the proxy route
    pub sessions: SessionsProxyConfig,
}

/// Build the API router. Split out from [`start_server`] so tests can
/// drive it without a listener.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state).post(post_state))
        .route("/sessions", get(get_sessions))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Start the API server and block until shutdown.
pub async fn start_server(
    store: StateStore,
    sessions: SessionsProxyConfig,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let location = store.location();
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        sessions,
    };
    let app = build_router(state);

    let host_addr: std::net::IpAddr = host
        .parse()
        .map_err(|e| format!("Invalid host address '{}': {}", host, e))?;
    let addr = SocketAddr::from((host_addr, port));

    info!(%addr, store = %location, "starting weekbank API");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

/// Full snapshot, recalculated. Reads never fail: a broken store serves
/// the seed snapshot instead.
async fn get_state(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.store.lock().await;
    let snapshot = store.load_or_seed();
    Json(serde_json::to_value(&snapshot).unwrap_or_else(|_| serde_json::json!({})))
}

/// Replace the snapshot. The body's sections are optional; missing ones
/// become empty. Malformed JSON is rejected with 400 by the extractor.
async fn post_state(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let mut store = state.store.lock().await;
    let snapshot = store.save(request).map_err(|e| {
        error!(error = %e, "state save failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "state": snapshot,
    })))
}

/// Date-range query for the session proxy.
#[derive(Debug, Deserialize)]
struct SessionsQuery {
    start: Option<String>,
    end: Option<String>,
}

/// Proxy the upstream session provider's listing for a date range.
///
/// The provider call is blocking, so it runs on the blocking pool.
/// Upstream failures pass through with their original status; successful
/// responses are marked cacheable for five minutes.
async fn get_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionsQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let (Some(start), Some(end)) = (query.start, query.end) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Missing start or end date parameters" })),
        ));
    };
    let Some(api_key) = state.sessions.api_key.clone() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "session provider API key not configured" })),
        ));
    };

    let api_url = state.sessions.api_url.clone();
    let result =
        tokio::task::spawn_blocking(move || fetch_sessions(&api_url, &api_key, &start, &end))
            .await;

    match result {
        Ok(Ok(data)) => Ok((
            [(header::CACHE_CONTROL, "public, max-age=300")],
            Json(data),
        )),
        Ok(Err(SessionsProxyError::Upstream { status, details })) => Err((
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(serde_json::json!({
                "error": format!("session provider returned {}", status),
                "details": details,
            })),
        )),
        Ok(Err(e)) => {
            error!(error = %e, "session provider request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "failed to fetch session data",
                    "details": e.to_string(),
                })),
            ))
        }
        Err(e) => {
            error!(error = %e, "session proxy task failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "failed to fetch session data" })),
            ))
        }
    }
}

/// Service info for platform health checks.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.store.lock().await;
    Json(serde_json::json!({
        "name": "weekbank",
        "version": env!("CARGO_PKG_VERSION"),
        "built": env!("WB_BUILD_TIMESTAMP"),
        "commit": env!("WB_GIT_COMMIT"),
        "backend": store.backend_type(),
        "status": "ok",
    }))
}
