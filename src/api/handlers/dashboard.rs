//! Handler for the dashboard endpoint.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::api::dto::links::{DashboardQuery, DashboardResponse};
use crate::domain::entities::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// Aggregate link counters plus the most visited links.
///
/// # Endpoint
///
/// `GET /api/dashboard?top=5`
///
/// # Response
///
/// ```json
/// {
///   "summary": { "total": 12, "active": 10, "inactive": 2, "total_visits": 3400 },
///   "top_links": [ ... ]
/// }
/// ```
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = state.link_service.dashboard(&identity, query.top).await?;
    let settings = state.settings_service.current().await?;

    Ok(Json(DashboardResponse::new(dashboard, &settings)))
}
