use crate::{
    AppState,
    handlers::{auth_api, pages},
};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session. `/login` is where every protected page
/// sends anonymous visitors.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(pages::health))
        .route("/", get(pages::index))
        // GET/POST /login
        // Sign-in form and credential check. POST accepts a form or a JSON body.
        .route("/login", get(pages::login_page).post(pages::login))
        // Logout is accepted on GET as well so a plain link works.
        .route("/logout", get(pages::logout).post(pages::logout))
        // GET /api/auth/check-auth
        // Reports the session state; never rejects.
        .route("/api/auth/check-auth", get(auth_api::check_auth))
}
