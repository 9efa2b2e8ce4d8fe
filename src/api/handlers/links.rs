//! Handlers for link management endpoints.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, LinkListQuery, LinkResponse, UpdateLinkRequest};
use crate::domain::entities::{Identity, Paginated};
use crate::error::AppError;
use crate::state::AppState;

/// Lists links, one page at a time.
///
/// # Endpoint
///
/// `GET /api/links?search=&active=&sort=created_at|visits&page=&limit=`
///
/// `search` is a case-insensitive substring match over slug, target URL and
/// title.
///
/// # Errors
///
/// Returns 400 Bad Request if `page` or `limit` is out of range.
pub async fn link_list_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<LinkListQuery>,
) -> Result<Json<Paginated<LinkResponse>>, AppError> {
    let page = state
        .link_service
        .list(&identity, query.into_filter())
        .await?;
    let settings = state.settings_service.current().await?;

    Ok(Json(page.map(|link| LinkResponse::new(link, &settings))))
}

/// Creates a link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "slug": "spring-sale",                      // optional, generated if absent
///   "target_url": "https://shop.example.com/sale",
///   "metadata": { "title": "Spring sale" },     // optional
///   "active": true                              // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request with per-field details if validation fails.
/// Returns 403 Forbidden for non-admin callers.
/// Returns 409 Conflict if the slug is taken.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(&identity, payload.into())
        .await?;
    let settings = state.settings_service.current().await?;

    Ok((StatusCode::CREATED, Json(LinkResponse::new(link, &settings))))
}

/// `GET /api/links/{id}`
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get(&identity, id).await?;
    let settings = state.settings_service.current().await?;

    Ok(Json(LinkResponse::new(link, &settings)))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// All fields are optional. Only provided fields are changed. Cached
/// resolutions for the old and the new slug are invalidated.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
/// Returns 409 Conflict if the new slug belongs to another link.
/// Returns 400 Bad Request if the body is empty or invalid.
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update(&identity, id, payload.into())
        .await?;
    let settings = state.settings_service.current().await?;

    Ok(Json(LinkResponse::new(link, &settings)))
}

/// Permanently deletes a link.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// The slug becomes available for new links immediately.
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist.
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
