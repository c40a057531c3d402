//! Business orchestration between the HTTP handlers and the repository:
//! validation, uniqueness checks, role resolution and password hashing.

mod role_service;
mod user_service;

pub use role_service::RoleService;
pub use user_service::UserService;
