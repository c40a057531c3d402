use crate::{
    error::AppError,
    models::Role,
    repository::{RepositoryError, RepositoryState},
};

/// RoleService
///
/// Role lookups and maintenance. Name lookups from user input are trimmed and
/// case-insensitive; uniqueness on write is exact.
#[derive(Clone)]
pub struct RoleService {
    repo: RepositoryState,
}

impl RoleService {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn all_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = self.repo.find_all_roles().await?;
        tracing::debug!("retrieved {} roles", roles.len());
        Ok(roles)
    }

    pub async fn add_role(&self, name: &str) -> Result<Role, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Role name cannot be empty"));
        }
        match self.repo.insert_role(name).await {
            Ok(role) => {
                tracing::info!(role = %role.name, id = role.id, "role created");
                Ok(role)
            }
            Err(RepositoryError::Duplicate(name)) => Err(AppError::DuplicateRole(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Renames a role. Keeping the current name always succeeds; a new name must not
    /// belong to another role.
    pub async fn update_role(&self, id: i64, name: &str) -> Result<Role, AppError> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Role name cannot be empty"));
        }
        let existing = self
            .repo
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::RoleIdNotFound(id))?;

        if existing.name != name && self.repo.find_role_by_name(name).await?.is_some() {
            return Err(AppError::DuplicateRole(name.to_string()));
        }

        let role = Role {
            id,
            name: name.to_string(),
        };
        match self.repo.update_role(&role).await {
            Ok(role) => Ok(role),
            Err(RepositoryError::Duplicate(name)) => Err(AppError::DuplicateRole(name)),
            Err(RepositoryError::NotFound(_)) => Err(AppError::RoleIdNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_role(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete_role_by_id(id).await? {
            tracing::info!(id, "role deleted");
            Ok(())
        } else {
            Err(AppError::RoleIdNotFound(id))
        }
    }

    pub async fn get_role_by_id(&self, id: i64) -> Result<Option<Role>, AppError> {
        Ok(self.repo.find_role_by_id(id).await?)
    }

    /// Trimmed, case-insensitive lookup. Unknown names fail with `RoleNotFound`.
    pub async fn get_role_by_name(&self, name: &str) -> Result<Role, AppError> {
        let cleaned = name.trim();
        if let Some(role) = self.repo.find_role_by_name_ignore_case(cleaned).await? {
            return Ok(role);
        }

        let available: Vec<String> = self
            .repo
            .find_all_roles()
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect();
        tracing::debug!(requested = cleaned, ?available, "role not found");
        Err(AppError::RoleNotFound(cleaned.to_string()))
    }
}
