//! Handlers for site settings.

use axum::{Extension, Json, extract::State};

use crate::domain::entities::{Identity, SettingsPatch, SiteSettings};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/settings` - readable by any authenticated identity.
pub async fn get_settings_handler(
    State(state): State<AppState>,
) -> Result<Json<SiteSettings>, AppError> {
    Ok(Json(state.settings_service.current().await?))
}

/// Applies a partial settings update.
///
/// # Endpoint
///
/// `PUT /api/settings`
///
/// Absent fields keep their current value.
///
/// # Errors
///
/// Returns 403 Forbidden for callers below super-admin.
/// Returns 400 Bad Request if the merged settings are invalid.
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SiteSettings>, AppError> {
    let settings = state.settings_service.update(&identity, patch).await?;

    Ok(Json(settings))
}
