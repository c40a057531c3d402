//! HTTP handlers.
//!
//! `pages` and `admin` serve the browser UI (HTML and redirects); `users_api`,
//! `roles_api` and `auth_api` serve the JSON REST API.

pub mod admin;
pub mod auth_api;
pub mod pages;
pub mod roles_api;
pub mod users_api;

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::{AppState, auth::AuthUser, models::UserDao};

/// IdQuery
///
/// `?id=` parameter of the admin pages. Kept as text so a malformed id turns into the
/// page's own error redirect instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
    pub error: Option<String>,
}

impl IdQuery {
    pub fn id(&self) -> Option<i64> {
        self.id.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}

/// ErrorQuery
///
/// `?error=<code>` parameter used by pages that display a failure from a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

/// The signed-in user as shown in the page header. `None` if the account vanished.
pub(crate) async fn header_user(state: &AppState, auth: &AuthUser) -> Option<UserDao> {
    match state.users().get_user_dao_by_id(auth.id).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("could not load current user {}: {e}", auth.id);
            None
        }
    }
}

pub(crate) fn redirect(location: &str) -> Response {
    Redirect::to(location).into_response()
}
