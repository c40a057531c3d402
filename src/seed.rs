use crate::{
    config::AppConfig,
    error::AppError,
    models::{ADMIN_ROLE, DEFAULT_ROLE, NewUser, Role},
    password,
    repository::RepositoryState,
};

/// load_initial_data
///
/// Ensures the `user` and `admin` roles and the configured administrator account
/// exist. Safe to run on every start.
pub async fn load_initial_data(repo: &RepositoryState, config: &AppConfig) -> Result<(), AppError> {
    let user_role = ensure_role(repo, DEFAULT_ROLE).await?;
    let admin_role = ensure_role(repo, ADMIN_ROLE).await?;

    if repo.find_user_by_email(&config.admin_email).await?.is_some() {
        tracing::debug!(email = %config.admin_email, "admin user already present");
        return Ok(());
    }

    let admin = NewUser {
        first_name: "Admin".to_string(),
        last_name: "Administrator".to_string(),
        email: config.admin_email.clone(),
        password: password::hash_password(&config.admin_password).await?,
        age: 30,
        roles: vec![admin_role, user_role],
    };
    let admin = repo.insert_user(admin).await?;
    tracing::info!(id = admin.id, email = %admin.email, "admin user created");

    Ok(())
}

async fn ensure_role(repo: &RepositoryState, name: &str) -> Result<Role, AppError> {
    if let Some(role) = repo.find_role_by_name(name).await? {
        return Ok(role);
    }
    let role = repo.insert_role(name).await?;
    tracing::info!(role = %role.name, "role created");
    Ok(role)
}
