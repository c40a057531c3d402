use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use minijinja::context;
use serde::Deserialize;

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::AppError,
    models::{LoginRequest, LoginResponse, UserDao},
};

use super::redirect;

/// LoginPageQuery
///
/// `/login?error` after a failed attempt, `/login?logout` after signing out.
#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
    pub logout: Option<String>,
}

/// LoginPayload
///
/// Credentials posted to `/login`. Browsers send a urlencoded form; script clients send
/// JSON and get a JSON answer instead of a redirect. An unreadable body carries no
/// credentials and is answered like a failed login.
pub struct LoginPayload {
    pub credentials: Option<LoginRequest>,
    pub wants_json: bool,
}

fn header_contains(headers: &HeaderMap, name: header::HeaderName, needle: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(needle))
}

impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_body = header_contains(req.headers(), header::CONTENT_TYPE, "application/json");
        let wants_json = json_body || header_contains(req.headers(), header::ACCEPT, "application/json");

        let credentials = if json_body {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(credentials)| credentials)
                .map_err(|e| tracing::debug!("unreadable login body: {e}"))
                .ok()
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(credentials)| credentials)
                .map_err(|e| tracing::debug!("unreadable login form: {e}"))
                .ok()
        };

        Ok(Self {
            credentials,
            wants_json,
        })
    }
}

/// GET /: the application starts at the login page.
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

pub async fn health() -> &'static str {
    "ok"
}

/// login_page
///
/// [Public Route] Renders the sign-in form, with a notice after a failed attempt or a logout.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginPageQuery>,
) -> Result<Response, AppError> {
    let page = state.views.render(
        "login.html",
        context! {
            error => query.error.is_some(),
            logout => query.logout.is_some(),
        },
    )?;
    Ok(page.into_response())
}

/// login
///
/// [Public Route] Checks the credentials and opens a session.
///
/// On success the session cookie is set; browsers are redirected to `/admin` (admins)
/// or `/user`, JSON clients receive `{"success": true, "isAdmin": ..}`.
/// On failure browsers go back to `/login?error` and JSON clients receive a 401.
pub async fn login(
    State(state): State<AppState>,
    payload: LoginPayload,
) -> Result<Response, AppError> {
    let LoginPayload {
        credentials,
        wants_json,
    } = payload;

    let user = match &credentials {
        Some(credentials) => {
            state
                .users()
                .authenticate(&credentials.email, &credentials.password)
                .await?
        }
        None => None,
    };

    let Some(user) = user else {
        let email = credentials.as_ref().map(|c| c.email.as_str()).unwrap_or_default();
        tracing::info!(email, "login failed");
        if wants_json {
            let body = LoginResponse {
                success: false,
                is_admin: false,
            };
            return Ok((StatusCode::UNAUTHORIZED, Json(body)).into_response());
        }
        return Ok(redirect("/login?error"));
    };

    let token = auth::issue_token(&state.config, &user)?;
    let cookie = auth::session_cookie(&state.config, &token);
    let set_cookie = AppendHeaders([(header::SET_COOKIE, cookie.to_string())]);
    let is_admin = user.is_admin();
    tracing::info!(id = user.id, is_admin, "login succeeded");

    if wants_json {
        let body = LoginResponse {
            success: true,
            is_admin,
        };
        return Ok((set_cookie, Json(body)).into_response());
    }

    let target = if is_admin { "/admin" } else { "/user" };
    Ok((set_cookie, Redirect::to(target)).into_response())
}

/// logout
///
/// [Public Route] Drops the session cookie and returns to the login page.
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = auth::logout_cookie(&state.config);
    (
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Redirect::to("/login?logout"),
    )
        .into_response()
}

/// user_page
///
/// [Authenticated Route] Shows the signed-in user's own record.
pub async fn user_page(State(state): State<AppState>, auth: AuthUser) -> Response {
    let user = match state.users().current_user(&auth).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("user page failed for {}: {e}", auth.id);
            return redirect("/login?error");
        }
    };

    let dao = UserDao::from(&user);
    match state.views.render(
        "user.html",
        context! {
            current_user => &dao,
            user => &dao,
            is_admin => user.is_admin(),
        },
    ) {
        Ok(page) => page.into_response(),
        Err(e) => e.into_response(),
    }
}
