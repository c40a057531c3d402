use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    models::{ADMIN_ROLE, User, same_role_name},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the session token issued at login. It travels in the session cookie
/// (browser) or in an `Authorization: Bearer` header (API clients).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user id. Used to reload the user (and its roles) on every request.
    pub sub: i64,
    /// The email the user logged in with.
    pub email: String,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Unique token id.
    pub jti: String,
}

/// AuthUser
///
/// The resolved identity of an authenticated request: who the caller is and which
/// roles they currently hold.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|role| same_role_name(role, ADMIN_ROLE))
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            roles: user.role_names(),
        }
    }
}

/// issue_token
///
/// Signs a session token for `user`, valid for `token_ttl_hours`.
pub fn issue_token(config: &AppConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now + Duration::hours(config.token_ttl_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Validates signature and expiry of a session token.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// HttpOnly session cookie carrying `token`.
pub fn session_cookie(config: &AppConfig, token: &str) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Strict)
        .max_age(cookie::time::Duration::hours(config.token_ttl_hours))
        .build()
}

/// Expired cookie that makes the browser drop the session.
pub fn logout_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .same_site(SameSite::Strict)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}

/// Finds the session token: the bearer header wins over the cookie.
fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw.to_string()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. An identity already resolved by an auth middleware (request extension).
/// 2. Local Bypass: `x-user-id` header, only in `Env::Local` without a database, must
///    name an existing user.
/// 3. Session token from the bearer header or the session cookie.
/// 4. DB Lookup: the token's user must still exist; roles are read fresh.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.dev_bypass_enabled() {
            if let Some(user_id) = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<i64>().ok())
            {
                if let Ok(Some(user)) = repo.find_user_by_id(user_id).await {
                    return Ok(AuthUser::from(&user));
                }
            }
        }

        let token = token_from_headers(&parts.headers, &config.cookie_name)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = decode_token(&config, &token).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                _ => tracing::debug!("rejected session token: {e}"),
            }
            StatusCode::UNAUTHORIZED
        })?;

        // Deleted users lose access even while their token is still valid.
        let user = repo
            .find_user_by_id(claims.sub)
            .await
            .map_err(|e| {
                tracing::error!("user lookup during authentication failed: {e}");
                StatusCode::UNAUTHORIZED
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser::from(&user))
    }
}
