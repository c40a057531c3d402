use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod seed;
pub mod services;
pub mod views;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use error::AppError;
use handlers::{auth_api, roles_api, users_api};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use services::{RoleService, UserService};
pub use views::{Views, ViewsState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the REST API from the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` annotations.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        users_api::list_users, users_api::get_user, users_api::current_user,
        users_api::get_user_by_email, users_api::create_user, users_api::update_user,
        users_api::patch_user, users_api::delete_user,
        roles_api::list_roles, roles_api::get_role, roles_api::get_role_by_name,
        roles_api::create_role, roles_api::update_role, roles_api::delete_role,
        auth_api::user_info, auth_api::check_auth
    ),
    components(
        schemas(
            models::Role, models::UserDao, models::UserPatch, models::RoleRequest,
            models::LoginRequest, models::LoginResponse, models::UserInfo,
            models::AuthStatus, models::MessageResponse, error::ErrorResponse,
        )
    ),
    tags(
        (name = "users", description = "User management"),
        (name = "roles", description = "Role management"),
        (name = "auth", description = "Session introspection")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request: persistence, configuration
/// and the compiled page templates.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Postgres in production, in-memory for local runs and tests.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Server-side templates.
    pub views: ViewsState,
}

impl AppState {
    /// Builds the state and compiles the templates. Fails only on a broken template.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Result<Self, minijinja::Error> {
        Ok(Self {
            repo,
            config,
            views: Arc::new(Views::new()?),
        })
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.repo.clone())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.repo.clone())
    }
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors pull single components out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for ViewsState {
    fn from_ref(app_state: &AppState) -> ViewsState {
        app_state.views.clone()
    }
}

// --- Access Control Middleware ---

// Each middleware resolves the caller once and stores it as a request extension, where
// the `AuthUser` extractor in the handler picks it up without a second lookup.

/// api_auth_middleware
///
/// Guards authenticated JSON routes. Rejects anonymous callers with a JSON 401.
async fn api_auth_middleware(
    auth: Result<AuthUser, StatusCode>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => AppError::Unauthorized.into_response(),
    }
}

/// api_admin_middleware
///
/// Guards admin JSON routes: 401 for anonymous callers, 403 for non-admins.
async fn api_admin_middleware(
    auth: Result<AuthUser, StatusCode>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth {
        Ok(user) if user.is_admin() => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(user) => {
            tracing::warn!(id = user.id, uri = %request.uri(), "admin API access denied");
            AppError::Forbidden.into_response()
        }
        Err(_) => AppError::Unauthorized.into_response(),
    }
}

/// page_auth_middleware
///
/// Guards authenticated pages. Anonymous visitors are sent to the login form.
async fn page_auth_middleware(
    auth: Result<AuthUser, StatusCode>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(_) => Redirect::to("/login").into_response(),
    }
}

/// page_admin_middleware
///
/// Guards the admin UI. Anonymous visitors are sent to the login form; signed-in
/// non-admins get the 403 "access denied" page.
async fn page_admin_middleware(
    State(views): State<ViewsState>,
    auth: Result<AuthUser, StatusCode>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth {
        Ok(user) if user.is_admin() => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(user) => {
            tracing::warn!(id = user.id, uri = %request.uri(), "admin page access denied");
            match views.render("forbidden.html", context! {}) {
                Ok(page) => (StatusCode::FORBIDDEN, page).into_response(),
                Err(e) => e.into_response(),
            }
        }
        Err(_) => Redirect::to("/login").into_response(),
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI plus the raw OpenAPI JSON.
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: any signed-in user.
        .merge(
            authenticated::page_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                page_auth_middleware,
            )),
        )
        .merge(
            authenticated::api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                api_auth_middleware,
            )),
        )
        // Admin Routes: authentication plus the `admin` role.
        .merge(
            admin::page_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                page_admin_middleware,
            )),
        )
        .merge(
            admin::api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                api_admin_middleware,
            )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, tagged with the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request tracing span from the method, URI and `x-request-id`, so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
