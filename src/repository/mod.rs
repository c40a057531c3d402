use crate::models::{NewUser, Role, User};
use async_trait::async_trait;
use std::sync::Arc;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Failures surfaced by the persistence layer. Unique-constraint violations are
/// reported as `Duplicate` so the services can turn them into conflicts.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("duplicate value: {0}")]
    Duplicate(String),
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Repository Trait
///
/// The persistence contract for users, roles and the `users_roles` join table.
/// Handlers and services only ever see `Arc<dyn Repository>`, so the Postgres
/// implementation can be swapped for the in-memory one (local runs, tests).
///
/// Users are always returned with their roles resolved.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
    // Exact (case-sensitive) email match.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    async fn find_all_users(&self) -> Result<Vec<User>, RepositoryError>;
    // Inserts the user and its role links atomically.
    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    // Overwrites every column and replaces the role links atomically.
    async fn update_user(&self, user: &User) -> Result<User, RepositoryError>;
    // Returns false when no user had this id.
    async fn delete_user_by_id(&self, id: i64) -> Result<bool, RepositoryError>;

    // --- Roles ---
    async fn find_all_roles(&self) -> Result<Vec<Role>, RepositoryError>;
    async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>, RepositoryError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;
    async fn find_role_by_name_ignore_case(
        &self,
        name: &str,
    ) -> Result<Option<Role>, RepositoryError>;
    async fn insert_role(&self, name: &str) -> Result<Role, RepositoryError>;
    async fn update_role(&self, role: &Role) -> Result<Role, RepositoryError>;
    async fn delete_role_by_id(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
