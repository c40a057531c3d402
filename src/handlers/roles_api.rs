use axum::{extract::State, http::StatusCode};

use crate::{
    AppState,
    error::{AppError, ErrorResponse},
    extract::{Json, Path},
    models::{MessageResponse, Role, RoleRequest},
};

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "roles",
    responses((status = 200, description = "All roles", body = [Role]))
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.roles().all_roles().await?))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Found", body = Role),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    state
        .roles()
        .get_role_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::RoleIdNotFound(id))
}

/// get_role_by_name
///
/// [Admin Route] Lookup by name, trimmed and case-insensitive.
#[utoipa::path(
    get,
    path = "/api/roles/name/{name}",
    tag = "roles",
    params(("name" = String, Path, description = "Role name")),
    responses(
        (status = 200, description = "Found", body = Role),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_role_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Role>, AppError> {
    Ok(Json(state.roles().get_role_by_name(&name).await?))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "roles",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 409, description = "Role already exists", body = ErrorResponse)
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<RoleRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    state.roles().add_role(&payload.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Role created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "roles",
    request_body = RoleRequest,
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 409, description = "Name taken by another role", body = ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoleRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.roles().update_role(id, &payload.name).await?;
    Ok(Json(MessageResponse::new("Role updated successfully")))
}

/// delete_role
///
/// [Admin Route] Removes the role and its assignments.
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.roles().delete_role(id).await?;
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}
