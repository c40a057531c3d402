use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorResponse},
    extract::Json,
    models::{AuthStatus, UserInfo},
};

/// user_info
///
/// [Authenticated Route] Profile of the caller including the `isAdmin` flag the browser
/// client uses to pick a landing page.
#[utoipa::path(
    get,
    path = "/api/auth/userinfo",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn user_info(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserInfo>, AppError> {
    let user = state.users().current_user(&auth).await?;
    Ok(Json(UserInfo::from(&user)))
}

/// check_auth
///
/// [Public Route] Always 200; reports whether the request carries a valid session.
#[utoipa::path(
    get,
    path = "/api/auth/check-auth",
    tag = "auth",
    responses((status = 200, description = "Authentication status", body = AuthStatus))
)]
pub async fn check_auth(auth: Result<AuthUser, StatusCode>) -> Json<AuthStatus> {
    let status = match auth {
        Ok(user) => AuthStatus {
            authenticated: true,
            username: Some(user.email),
            authorities: Some(user.roles),
        },
        Err(_) => AuthStatus {
            authenticated: false,
            username: None,
            authorities: None,
        },
    };
    Json(status)
}
