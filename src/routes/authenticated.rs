//! Authenticated Router Module
//!
//! Routes open to any signed-in user, admin or not. Every handler here receives the
//! caller as an `AuthUser` resolved by the layer above.

use crate::{
    AppState,
    handlers::{auth_api, pages, users_api},
};
use axum::{Router, routing::get};

/// Browser pages. Anonymous visitors are redirected to `/login`.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /user
        // The caller's own record.
        .route("/user", get(pages::user_page))
}

/// JSON endpoints. Anonymous callers get a 401.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/current", get(users_api::current_user))
        .route("/api/auth/userinfo", get(auth_api::user_info))
}
