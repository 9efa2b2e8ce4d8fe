//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`], which also makes the caller's
//! [`Identity`](crate::domain::entities::Identity) available to handlers.

use crate::api::handlers::{
    admin_list_handler, create_admin_handler, create_link_handler, dashboard_handler,
    delete_admin_handler, delete_link_handler, get_link_handler, get_settings_handler,
    link_list_handler, me_handler, update_admin_handler, update_link_handler,
    update_settings_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /me`            - Identity behind the token
/// - `GET    /links`         - List links (search, filter, sort, paginate)
/// - `POST   /links`         - Create a link
/// - `GET    /links/{id}`    - Fetch one link
/// - `PATCH  /links/{id}`    - Partially update a link
/// - `DELETE /links/{id}`    - Permanently delete a link
/// - `GET    /dashboard`     - Counters and most visited links
/// - `GET    /admins`        - List accounts
/// - `POST   /admins`        - Create an account
/// - `PATCH  /admins/{id}`   - Change an account's role
/// - `DELETE /admins/{id}`   - Delete an account
/// - `GET    /settings`      - Current site settings
/// - `PUT    /settings`      - Update site settings
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me_handler))
        .route("/links", get(link_list_handler).post(create_link_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/dashboard", get(dashboard_handler))
        .route("/admins", get(admin_list_handler).post(create_admin_handler))
        .route(
            "/admins/{id}",
            patch(update_admin_handler).delete(delete_admin_handler),
        )
        .route(
            "/settings",
            get(get_settings_handler).put(update_settings_handler),
        )
}
