//! Bearer token authentication for `/api`.
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! On success the caller's [`Identity`] is inserted into the request
//! extensions, where handlers pick it up with `Extension<Identity>`. Every
//! failure is a 401 carrying `WWW-Authenticate: Bearer`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::domain::entities::Identity;
use crate::{error::AppError, state::AppState};

/// Route layer for the protected API.
///
/// ```rust,ignore
/// let api = api::routes::protected_routes()
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = bearer_token(&mut parts).await?;
    let identity: Identity = state.auth_service.authenticate(&token).await?;

    tracing::debug!(
        admin_id = identity.admin_id,
        role = identity.role.as_str(),
        path = %parts.uri.path(),
        "Authenticated request"
    );

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

async fn bearer_token(parts: &mut Parts) -> Result<String, AppError> {
    let AuthBearer(token) = AuthBearer::from_request_parts(parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header is missing or invalid" }),
            )
        })?;

    if token.trim().is_empty() {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({ "reason": "Empty bearer token" }),
        ));
    }

    Ok(token)
}
