//! Admin Router Module
//!
//! User and role management, restricted to the `admin` role. The page router answers
//! non-admins with the "access denied" page; the API router answers with a JSON 403.

use crate::{
    AppState,
    handlers::{admin, roles_api, users_api},
};
use axum::{Router, routing::get};

/// The admin browser UI under `/admin`.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /admin lists users; POST /admin is kept as an alias of the creation form target.
        .route("/admin", get(admin::admin_page).post(admin::add_user))
        .route("/admin/newUser", get(admin::new_user_form))
        .route(
            "/admin/userAdd",
            get(admin::new_user_form).post(admin::add_user),
        )
        .route("/admin/delete", get(admin::delete_user))
        .route("/admin/updateUserForm", get(admin::edit_user_form))
        .route(
            "/admin/editUser",
            get(admin::edit_user_form).post(admin::update_user),
        )
        // GET /admin/getUserData?id=
        // JSON record for the edit dialog.
        .route("/admin/getUserData", get(admin::get_user_data))
}

/// The REST API for users and roles.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // --- Users ---
        .route(
            "/api/users",
            get(users_api::list_users).post(users_api::create_user),
        )
        .route(
            "/api/users/{id}",
            get(users_api::get_user)
                .put(users_api::update_user)
                .patch(users_api::patch_user)
                .delete(users_api::delete_user),
        )
        .route("/api/users/email/{email}", get(users_api::get_user_by_email))
        // --- Roles ---
        .route(
            "/api/roles",
            get(roles_api::list_roles).post(roles_api::create_role),
        )
        .route(
            "/api/roles/{id}",
            get(roles_api::get_role)
                .put(roles_api::update_role)
                .delete(roles_api::delete_role),
        )
        .route("/api/roles/name/{name}", get(roles_api::get_role_by_name))
}
