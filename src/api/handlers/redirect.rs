//! Handlers for the public slug endpoints.

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use tracing::{debug, warn};

use crate::api::dto::links::PreviewResponse;
use crate::domain::entities::{Resolution, ResolvedLink};
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target URL.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Request Flow
///
/// 1. Resolve the slug (cache, then storage)
/// 2. Hand a visit event to the background worker
/// 3. Return 307 Temporary Redirect
///
/// # Visit Accounting
///
/// Visit events go to a bounded channel. If the queue is full or closed the
/// visit is dropped and counted in `visits_dropped_total`; the redirect is
/// served either way.
///
/// # Errors
///
/// Returns 404 Not Found for unknown, malformed and inactive slugs alike.
/// Returns 503 if storage is unreachable.
pub async fn redirect_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let link = resolve_or_404(&state, &slug).await?;

    dispatch_visit(&state, &link);

    Ok(Redirect::temporary(&link.target_url))
}

/// Returns what a preview page needs for an active link.
///
/// # Endpoint
///
/// `GET /preview/{slug}`
///
/// No visit is recorded.
pub async fn preview_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, AppError> {
    let link = resolve_or_404(&state, &slug).await?;
    let settings = state.settings_service.current().await?;

    Ok(Json(PreviewResponse::new(link, &settings)))
}

async fn resolve_or_404(state: &AppState, slug: &str) -> Result<ResolvedLink, AppError> {
    match state.resolver.resolve(slug).await? {
        Resolution::Found(link) => Ok(link),
        Resolution::NotFound => {
            debug!(slug, "Slug did not resolve");
            Err(AppError::link_not_found())
        }
    }
}

fn dispatch_visit(state: &AppState, link: &ResolvedLink) {
    let event = VisitEvent::new(link.link_id, &link.slug);

    if let Err(e) = state.visit_sender.try_send(event) {
        metrics::counter!("visits_dropped_total").increment(1);
        warn!(slug = %link.slug, error = %e, "Visit event dropped");
    }
}
