//! HTTP router: route tiers, auth layers and global middleware

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::database::DatabaseManager;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware};

/// Full application router
pub fn router() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Authenticated
        .merge(protected_routes())
        // Authenticated + admin role
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/register", post(auth::register_post))
}

fn protected_routes() -> Router {
    use protected::{auth, form};

    Router::new()
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/form/:id", get(form::form_get))
        .route("/api/form/:id/responses", post(form::response_post))
        .route("/api/form/responses/:response_id", get(form::response_get))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn admin_routes() -> Router {
    use elevated::{form, roles, users};

    Router::new()
        // User directory
        .route("/api/admin/users", get(users::user_list).post(users::user_create))
        .route("/api/admin/users/:user_id", get(users::user_show).put(users::user_update))
        // Roles and membership
        .route("/api/auth/roles", get(roles::role_list).post(roles::role_create))
        .route(
            "/api/auth/users/:user_id/roles",
            get(roles::user_roles_get).post(roles::user_role_add),
        )
        .route("/api/auth/users/:user_id/roles/:role_name", delete(roles::user_role_remove))
        // Form catalog
        .route("/api/form/forms", get(form::form_list).post(form::form_create))
        .route("/api/form/categories", get(form::category_list))
        .route("/api/form/create-category", post(form::category_create))
        .route("/api/form/form-field-types", get(form::field_type_list))
        .route("/api/form/:id/responses", get(form::response_list))
        // Layers run bottom-up: token first, then the role check
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Zero API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Administrative backend for users, roles and dynamic forms",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/auth/login, /api/auth/register (public - token acquisition)",
                "auth": "/api/auth/me (authenticated)",
                "form": "/api/form/:id, /api/form/:id/responses, /api/form/responses/:response_id (authenticated)",
                "roles": "/api/auth/roles, /api/auth/users/:user_id/roles (admin)",
                "admin": "/api/admin/users[/:user_id] (admin)",
                "catalog": "/api/form/forms, /api/form/categories, /api/form/form-field-types (admin)",
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    let ping = if DatabaseManager::is_configured() {
        DatabaseManager::health_check().await.map_err(|e| e.to_string())
    } else {
        Err("DATABASE_URL is not set".to_string())
    };

    match ping {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "code": "SERVICE_UNAVAILABLE",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e
                }
            })),
        ),
    }
}
