use std::env;

const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_COOKIE_NAME: &str = "admin_portal_session";
const DEFAULT_ADMIN_EMAIL: &str = "admin@admin.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_TOKEN_TTL_HOURS: i64 = 10;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// treated as immutable afterwards; handlers and extractors pull it out of the
/// shared state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls logging format, cookie flags and the dev bypass.
    pub env: Env,
    // HMAC secret used to sign and verify session tokens.
    pub jwt_secret: String,
    // Session token lifetime.
    pub token_ttl_hours: i64,
    // Name of the HttpOnly cookie carrying the session token.
    pub cookie_name: String,
    // Credentials of the administrator account created on first start.
    pub admin_email: String,
    pub admin_password: String,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (in-memory store, `x-user-id` bypass, pretty logs) and hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and implements the
    /// **fail-fast** principle for production secrets.
    ///
    /// # Panics
    /// Panics if `DATABASE_URL`, `JWT_SECRET` or `ADMIN_PASSWORD` is missing while
    /// `APP_ENV=production`, or if `TOKEN_TTL_HOURS` is not a positive integer.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => panic!("FATAL: TOKEN_TTL_HOURS must be a positive integer, got '{raw}'"),
            },
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let cookie_name =
            env::var("SESSION_COOKIE").unwrap_or_else(|_| DEFAULT_COOKIE_NAME.to_string());
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Without a database the local build falls back to the in-memory store.
                db_url: env::var("DATABASE_URL").ok(),
                bind_addr,
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                token_ttl_hours,
                cookie_name,
                admin_email,
                admin_password: env::var("ADMIN_PASSWORD")
                    .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                bind_addr,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                token_ttl_hours,
                cookie_name,
                admin_email,
                admin_password: env::var("ADMIN_PASSWORD")
                    .expect("FATAL: ADMIN_PASSWORD must be set in production."),
            },
        }
    }

    /// Session cookies are only marked `Secure` when served over HTTPS in production.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }

    /// The `x-user-id` header is only honoured locally against the in-memory store.
    /// A configured database always requires a real session.
    pub fn dev_bypass_enabled(&self) -> bool {
        self.env == Env::Local && self.db_url.is_none()
    }
}
