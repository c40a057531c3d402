use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use minijinja::context;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::Json,
    models::UserDao,
};

use super::{ErrorQuery, IdQuery, header_user, redirect};

fn admin_error_message(code: &str) -> &'static str {
    match code {
        "delete_failed" => "Failed to delete user",
        "user_not_found" => "User not found",
        _ => "An error occurred",
    }
}

fn new_user_error_message(code: &str) -> &'static str {
    match code {
        "email_exists" => "User with this email already exists!",
        _ => "An error occurred while creating the user",
    }
}

fn edit_user_error_message(code: &str) -> &'static str {
    match code {
        "update_failed" => "Failed to update user. The email may already be in use.",
        _ => "An error occurred while updating the user",
    }
}

fn render_or_error(result: Result<axum::response::Html<String>, AppError>) -> Response {
    match result {
        Ok(page) => page.into_response(),
        Err(e) => e.into_response(),
    }
}

/// admin_page
///
/// [Admin Route] The user table. A failure loading it sends the browser back to
/// `/login?error`.
pub async fn admin_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ErrorQuery>,
) -> Response {
    let users = match state.users().all_users_as_dao().await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!("admin page failed: {e}");
            return redirect("/login?error");
        }
    };
    let current_user = header_user(&state, &auth).await;

    render_or_error(state.views.render(
        "admin.html",
        context! {
            current_user => current_user,
            users => users,
            error => query.error.as_deref().map(admin_error_message),
        },
    ))
}

/// new_user_form
///
/// [Admin Route] Blank creation form listing every role as a checkbox.
pub async fn new_user_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ErrorQuery>,
) -> Response {
    let roles = match state.roles().all_roles().await {
        Ok(roles) => roles,
        Err(e) => return e.into_response(),
    };
    let current_user = header_user(&state, &auth).await;

    render_or_error(state.views.render(
        "new-user.html",
        context! {
            current_user => current_user,
            roles => roles,
            error_message => query.error.as_deref().map(new_user_error_message),
        },
    ))
}

/// add_user
///
/// [Admin Route] Creates a user from the submitted form (`roles` may repeat).
pub async fn add_user(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let dao = UserDao::from_form_pairs(pairs);
    tracing::debug!("admin form submitted: {dao}");

    match state.users().add_user(&dao).await {
        Ok(_) => redirect("/admin"),
        Err(AppError::EmailTaken(email)) => {
            tracing::info!(%email, "email already exists");
            redirect("/admin/newUser?error=email_exists")
        }
        Err(e) => {
            tracing::error!("failed to add user: {e}");
            redirect("/admin/newUser?error=system_error")
        }
    }
}

/// delete_user
///
/// [Admin Route] `GET /admin/delete?id=`.
pub async fn delete_user(State(state): State<AppState>, Query(query): Query<IdQuery>) -> Response {
    let Some(id) = query.id() else {
        return redirect("/admin?error=delete_failed");
    };

    match state.users().delete_user(id).await {
        Ok(()) => redirect("/admin"),
        Err(e) => {
            tracing::warn!("failed to delete user {id}: {e}");
            redirect("/admin?error=delete_failed")
        }
    }
}

/// edit_user_form
///
/// [Admin Route] Edit form pre-filled with the user's fields and current roles.
pub async fn edit_user_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<IdQuery>,
) -> Response {
    let user = match query.id() {
        Some(id) => state.users().get_user_dao_by_id(id).await,
        None => Ok(None),
    };
    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => return redirect("/admin?error=user_not_found"),
        Err(e) => {
            tracing::error!("failed to load user for editing: {e}");
            return redirect("/admin?error=user_not_found");
        }
    };

    let roles = match state.roles().all_roles().await {
        Ok(roles) => roles,
        Err(e) => return e.into_response(),
    };
    let current_user = header_user(&state, &auth).await;

    render_or_error(state.views.render(
        "edit-user.html",
        context! {
            current_user => current_user,
            user => user,
            roles => roles,
            error_message => query.error.as_deref().map(edit_user_error_message),
        },
    ))
}

/// update_user
///
/// [Admin Route] Applies the edit form. Unchecking every role falls back to the default
/// role; a blank password keeps the current one.
pub async fn update_user(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let dao = UserDao::from_form_pairs(pairs);
    let Some(id) = dao.id else {
        return redirect("/admin?error=user_not_found");
    };

    match state.users().update_user(&dao).await {
        Ok(_) => redirect("/admin"),
        Err(e @ (AppError::UserNotFound(_) | AppError::EmailTaken(_))) => {
            tracing::info!("update of user {id} rejected: {e}");
            redirect(&format!("/admin/updateUserForm?id={id}&error=update_failed"))
        }
        Err(e) => {
            tracing::error!("failed to update user {id}: {e}");
            redirect(&format!("/admin/updateUserForm?id={id}&error=system_error"))
        }
    }
}

/// get_user_data
///
/// [Admin Route] JSON view of one user for the admin page scripts.
pub async fn get_user_data(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<UserDao>, AppError> {
    let id = query
        .id()
        .ok_or_else(|| AppError::validation("User id is required"))?;
    state
        .users()
        .get_user_dao_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))
}
