use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use argon2::Argon2;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("password worker failed: {0}")]
    Task(String),
}

/// Hashes `plain` into a PHC string (Argon2id with a random salt).
///
/// Runs on the blocking pool.
pub async fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_password_blocking(&plain))
        .await
        .map_err(|err| PasswordError::Task(err.to_string()))?
}

/// Checks `plain` against a stored PHC string.
pub async fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let plain = plain.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || verify_password_blocking(&plain, &stored_hash))
        .await
        .map_err(|err| PasswordError::Task(err.to_string()))?
}

fn hash_password_blocking(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

fn verify_password_blocking(plain: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| PasswordError::MalformedHash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
