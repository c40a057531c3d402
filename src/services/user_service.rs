use crate::{
    auth::AuthUser,
    error::AppError,
    models::{DEFAULT_ROLE, NewUser, Role, User, UserDao},
    password,
    repository::{RepositoryError, RepositoryState},
};

use super::RoleService;

/// UserService
///
/// Orchestrates every user write: validate → check email uniqueness → resolve roles →
/// hash the password → persist. Reads convert entities into `UserDao`s for the HTTP
/// boundary.
#[derive(Clone)]
pub struct UserService {
    repo: RepositoryState,
    roles: RoleService,
}

impl UserService {
    pub fn new(repo: RepositoryState) -> Self {
        Self {
            roles: RoleService::new(repo.clone()),
            repo,
        }
    }

    pub async fn all_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.find_all_users().await?)
    }

    pub async fn all_users_as_dao(&self) -> Result<Vec<UserDao>, AppError> {
        Ok(self.all_users().await?.iter().map(UserDao::from).collect())
    }

    /// Creates a user from a transfer object. The password is mandatory.
    pub async fn add_user(&self, dao: &UserDao) -> Result<User, AppError> {
        tracing::debug!(email = %dao.email, "adding user");
        Self::validate_user_data(dao)?;

        if !self.is_email_unique(&dao.email).await? {
            tracing::info!(email = %dao.email, "email already exists");
            return Err(AppError::EmailTaken(dao.email.clone()));
        }

        let plain = dao
            .password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::validation("Password cannot be empty"))?;

        let new_user = NewUser {
            first_name: dao.first_name.clone(),
            last_name: dao.last_name.clone(),
            email: dao.email.clone(),
            password: password::hash_password(plain).await?,
            age: dao.age.unwrap_or_default(),
            roles: self.resolve_roles(&dao.roles).await?,
        };

        match self.repo.insert_user(new_user).await {
            Ok(user) => {
                tracing::info!(id = user.id, email = %user.email, "user created");
                Ok(user)
            }
            // Lost a race against a concurrent insert with the same email.
            Err(RepositoryError::Duplicate(email)) => Err(AppError::EmailTaken(email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Updates the user named by `dao.id`. A blank or absent password keeps the old hash.
    pub async fn update_user(&self, dao: &UserDao) -> Result<User, AppError> {
        tracing::debug!(id = ?dao.id, "updating user");
        Self::validate_user_data(dao)?;

        let id = dao
            .id
            .ok_or_else(|| AppError::validation("User id is required"))?;
        let mut user = self
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;

        if !self.is_email_unique_for_user(id, &dao.email).await? {
            tracing::info!(email = %dao.email, "email already exists");
            return Err(AppError::EmailTaken(dao.email.clone()));
        }

        user.first_name = dao.first_name.clone();
        user.last_name = dao.last_name.clone();
        user.age = dao.age.unwrap_or(user.age);
        user.email = dao.email.clone();
        user.roles = self.resolve_roles(&dao.roles).await?;

        match dao.password.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(plain) => {
                user.password = password::hash_password(plain).await?;
                tracing::debug!(id, "password updated");
            }
            None => tracing::debug!(id, "password not changed"),
        }

        match self.repo.update_user(&user).await {
            Ok(user) => {
                tracing::info!(id, "user updated");
                Ok(user)
            }
            Err(RepositoryError::Duplicate(email)) => Err(AppError::EmailTaken(email)),
            Err(RepositoryError::NotFound(_)) => Err(AppError::UserNotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        if self.repo.delete_user_by_id(id).await? {
            tracing::info!(id, "user deleted");
            Ok(())
        } else {
            Err(AppError::UserNotFound(id.to_string()))
        }
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.repo.find_user_by_id(id).await?)
    }

    pub async fn get_user_dao_by_id(&self, id: i64) -> Result<Option<UserDao>, AppError> {
        Ok(self.get_user_by_id(id).await?.as_ref().map(UserDao::from))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        self.repo
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))
    }

    /// Reloads the authenticated caller.
    pub async fn current_user(&self, auth: &AuthUser) -> Result<User, AppError> {
        self.get_user_by_id(auth.id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Credential check used by the login endpoint. Unknown email and wrong password
    /// are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, plain: &str) -> Result<Option<User>, AppError> {
        let Some(user) = self.repo.find_user_by_email(email).await? else {
            return Ok(None);
        };
        if password::verify_password(plain, &user.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn is_email_unique(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.repo.find_user_by_email(email).await?.is_none())
    }

    /// True when the email is free or already belongs to `user_id`.
    pub async fn is_email_unique_for_user(&self, user_id: i64, email: &str) -> Result<bool, AppError> {
        Ok(self
            .repo
            .find_user_by_email(email)
            .await?
            .is_none_or(|existing| existing.id == user_id))
    }

    pub fn validate_user_data(dao: &UserDao) -> Result<(), AppError> {
        if dao.first_name.trim().is_empty() {
            return Err(AppError::validation("First name cannot be empty"));
        }
        if dao.last_name.trim().is_empty() {
            return Err(AppError::validation("Last name cannot be empty"));
        }
        if dao.email.trim().is_empty() {
            return Err(AppError::validation("Email cannot be empty"));
        }
        if dao.age.is_none_or(|age| age <= 0) {
            return Err(AppError::validation("Age must be positive"));
        }
        Ok(())
    }

    /// Maps requested role names onto stored roles. Unknown names are skipped; with no
    /// names at all the default `user` role is assigned when it exists.
    async fn resolve_roles(&self, names: &[String]) -> Result<Vec<Role>, AppError> {
        if names.is_empty() {
            return match self.roles.get_role_by_name(DEFAULT_ROLE).await {
                Ok(role) => Ok(vec![role]),
                Err(AppError::RoleNotFound(_)) => {
                    tracing::warn!("default role '{DEFAULT_ROLE}' not found");
                    Ok(vec![])
                }
                Err(e) => Err(e),
            };
        }

        let mut resolved: Vec<Role> = Vec::with_capacity(names.len());
        for name in names {
            match self.roles.get_role_by_name(name).await {
                Ok(role) => {
                    if !resolved.iter().any(|r| r.id == role.id) {
                        resolved.push(role);
                    }
                }
                Err(AppError::RoleNotFound(_)) => tracing::warn!(role = %name, "skipping unknown role"),
                Err(e) => return Err(e),
            }
        }
        Ok(resolved)
    }
}
