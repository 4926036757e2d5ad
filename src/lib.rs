pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{jwt_auth_middleware, Db};

/// The complete HTTP application over one connection pool
pub fn app(pool: PgPool) -> Router {
    let config = config::config();

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes())
        .fallback(fallback)
        // Global middleware
        .layer(Extension(Db(pool)))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/token/refresh", post(auth::refresh_post))
}

fn protected_routes() -> Router {
    use axum::routing::post;
    use handlers::protected::{auth, employees, forms};

    Router::new()
        .route("/api/auth/profile", get(auth::profile_get))
        .route("/api/auth/change-password", post(auth::change_password_post))
        .route("/api/forms", get(forms::forms_get).post(forms::forms_post))
        .route(
            "/api/forms/:id",
            get(forms::form_get)
                .put(forms::form_put)
                .patch(forms::form_patch)
                .delete(forms::form_delete),
        )
        .route("/api/employees", get(employees::employees_get).post(employees::employees_post))
        .route(
            "/api/employees/:id",
            get(employees::employee_get)
                .put(employees::employee_put)
                .patch(employees::employee_patch)
                .delete(employees::employee_delete),
        )
        // Only matched routes are guarded; unknown paths still 404
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Dynaform API",
        "version": version,
        "description": "Dynamic form builder and submission store",
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/auth/{register,login,token/refresh} (public)",
            "account": "/api/auth/{profile,change-password} (protected)",
            "forms": "/api/forms[/:id] (protected)",
            "employees": "/api/employees[/:id] (protected)",
        }
    }))
}

async fn health(Extension(Db(pool)): Extension<Db>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Not found.")
}
