//! Handlers for the current identity and account management.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::admins::{
    AdminListQuery, AdminResponse, CreateAdminRequest, MeResponse, UpdateAdminRequest,
};
use crate::domain::entities::{Identity, Paginated};
use crate::error::AppError;
use crate::state::AppState;

/// `GET /api/me` - the identity behind the bearer token.
pub async fn me_handler(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(identity.into())
}

/// Lists accounts.
///
/// # Endpoint
///
/// `GET /api/admins?search=&role=&page=&limit=`
///
/// # Errors
///
/// Returns 403 Forbidden for non-admin callers.
pub async fn admin_list_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Paginated<AdminResponse>>, AppError> {
    let page = state
        .admin_service
        .list(&identity, query.into_filter())
        .await?;

    Ok(Json(page.map(AdminResponse::from)))
}

/// Creates an account.
///
/// # Endpoint
///
/// `POST /api/admins`
///
/// Granting `admin` or `super_admin` requires a super-admin caller.
///
/// # Errors
///
/// Returns 409 Conflict if the email is already registered.
pub async fn create_admin_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), AppError> {
    payload.validate()?;

    let admin = state
        .admin_service
        .create(&identity, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(admin.into())))
}

/// Changes an account's role.
///
/// # Endpoint
///
/// `PATCH /api/admins/{id}`
///
/// # Errors
///
/// Returns 409 Conflict when demoting the last super-admin.
pub async fn update_admin_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    let admin = state
        .admin_service
        .change_role(&identity, id, payload.role)
        .await?;

    Ok(Json(admin.into()))
}

/// Deletes an account and its API tokens.
///
/// # Endpoint
///
/// `DELETE /api/admins/{id}`
///
/// # Errors
///
/// Returns 400 Bad Request when deleting the caller's own account.
/// Returns 409 Conflict for the last super-admin.
pub async fn delete_admin_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, AppError> {
    state.admin_service.delete(&identity, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
