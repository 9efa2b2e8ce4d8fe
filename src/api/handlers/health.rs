//! `GET /health`: storage, visit queue and cache probes.

use axum::{Json, extract::State, http::StatusCode};
use std::time::Duration;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;
use crate::utils::deadline::bounded;

/// A probe slower than this counts as down.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Returns 200 when every component is healthy, 503 with the same body
/// otherwise.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "storage": { "status": "ok", "message": "Connected" },
///     "visit_queue": { "status": "ok", "message": "9998 of 10000 slots free" },
///     "cache": { "status": "ok", "message": "Cache reachable" }
///   }
/// }
/// ```
///
/// With caching disabled the cache check is always ok.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (storage, cache) = tokio::join!(probe_storage(&state), probe_cache(&state));
    let visit_queue = probe_visit_queue(&state);

    let healthy = storage.is_ok() && visit_queue.is_ok() && cache.is_ok();
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage,
            visit_queue,
            cache,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        tracing::warn!(
            storage = response.checks.storage.is_ok(),
            visit_queue = response.checks.visit_queue.is_ok(),
            cache = response.checks.cache.is_ok(),
            "Health check degraded"
        );
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn probe_storage(state: &AppState) -> CheckStatus {
    match bounded(PROBE_TIMEOUT, state.links.ping()).await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Storage error: {e}")),
    }
}

fn probe_visit_queue(state: &AppState) -> CheckStatus {
    let sender = &state.visit_sender;
    if sender.is_closed() {
        return CheckStatus::error("Visit worker stopped");
    }
    // A full queue drops visits but still serves redirects.
    if sender.capacity() == 0 {
        return CheckStatus::ok(format!("Queue full ({} events)", sender.max_capacity()));
    }
    CheckStatus::ok(format!(
        "{} of {} slots free",
        sender.capacity(),
        sender.max_capacity()
    ))
}

async fn probe_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache unreachable")
    }
}
