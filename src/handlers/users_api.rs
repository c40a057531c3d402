use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, ErrorResponse},
    extract::{Json, Path},
    models::{MessageResponse, UserDao, UserPatch},
};

/// list_users
///
/// [Admin Route] Every user, roles included, without password hashes.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses((status = 200, description = "All users", body = [UserDao]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserDao>>, AppError> {
    Ok(Json(state.users().all_users_as_dao().await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserDao),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserDao>, AppError> {
    state
        .users()
        .get_user_dao_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))
}

/// current_user
///
/// [Authenticated Route] The caller's own record.
#[utoipa::path(
    get,
    path = "/api/users/current",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserDao),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserDao>, AppError> {
    let user = state.users().current_user(&auth).await?;
    Ok(Json(UserDao::from(&user)))
}

#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Exact email address")),
    responses(
        (status = 200, description = "Found", body = UserDao),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserDao>, AppError> {
    let user = state.users().get_user_by_email(&email).await?;
    Ok(Json(UserDao::from(&user)))
}

/// create_user
///
/// [Admin Route] Creates a user. Without roles the user gets the default `user` role.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserDao,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(dao): Json<UserDao>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    tracing::debug!("create user request: {dao}");
    state.users().add_user(&dao).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}

/// update_user
///
/// [Admin Route] Full update. The path id wins over any id in the body; a blank or
/// missing password keeps the current one.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    request_body = UserDao,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut dao): Json<UserDao>,
) -> Result<Json<MessageResponse>, AppError> {
    dao.id = Some(id);
    state.users().update_user(&dao).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// patch_user
///
/// [Admin Route] Partial update: the stored user is overlaid with the supplied fields
/// and then saved like a full update.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    request_body = UserPatch,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<MessageResponse>, AppError> {
    let users = state.users();
    let mut dao = users
        .get_user_dao_by_id(id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;

    patch.apply_to(&mut dao);
    users.update_user(&dao).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.users().delete_user(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
