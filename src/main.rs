use axum::http::HeaderValue;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod intake;
mod middleware;
mod policy;
mod services;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting caseflow API in {:?} mode", config.environment);

    // Best effort: pools are lazy, so the server still boots when the
    // database is down and recovers once it is reachable.
    if let Err(e) = crate::database::manager::DatabaseManager::migrate().await {
        tracing::warn!("Skipping startup migrations: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CASEFLOW_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Caseflow API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Authenticated API
        .merge(protected_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;
    use handlers::{admin, auth, availabilities, public, webhooks};

    Router::new()
        // Token acquisition
        .route("/api/auth/login", post(auth::login))
        // Reports false rather than erroring, so it stays outside the auth layer
        .route("/api/admin/check-super-admin", get(admin::check_super_admin))
        // Candidate-facing flow
        .route("/api/public/cases/:public_id", get(public::candidate_case))
        .route("/api/candidate-availabilities", post(availabilities::submit))
        // Signed inbound-email bridge
        .route("/api/webhooks/zapier", post(webhooks::zapier))
}

fn protected_routes() -> Router {
    use axum::routing::{patch, post};
    use handlers::{admin, auth, cases, slots, tenants, users};

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/reset-password", post(auth::reset_password))
        // Platform administration (super-admin gated in the policy engine)
        .route("/api/admin/tenants", get(admin::list_tenants))
        .route(
            "/api/admin/tenants/:tenant_id/toggle-active",
            patch(admin::toggle_tenant_active),
        )
        // Tenant provisioning
        .route("/api/tenants/create", post(tenants::create_tenant))
        // User management
        .route("/api/users", get(users::list_users))
        .route("/api/users/create", post(users::create_user))
        .route(
            "/api/users/:user_id/toggle-active",
            patch(users::toggle_user_active),
        )
        // Case intake and management
        .route(
            "/api/create-case-from-email",
            post(cases::create_case_from_email),
        )
        .route("/api/cases", get(cases::list_cases))
        .route("/api/cases/:case_id", get(cases::get_case))
        .route("/api/cases/:case_id/status", patch(cases::update_case_status))
        .route("/api/cases/:case_id/slots", post(slots::create_slot))
        .route(
            "/api/slots/:slot_id",
            patch(slots::update_slot).delete(slots::delete_slot),
        )
        .route_layer(axum::middleware::from_fn(
            middleware::auth::jwt_auth_middleware,
        ))
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;

    if !security.enable_cors {
        return CorsLayer::new();
    }

    if matches!(config::config().environment, config::Environment::Development) {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Caseflow API",
        "version": version,
        "description": "Multi-tenant interview scheduling backend",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "login": "/api/auth/login (public - token acquisition)",
            "candidate": "/api/public/cases/:public_id, /api/candidate-availabilities (public)",
            "webhooks": "/api/webhooks/zapier (signed)",
            "cases": "/api/cases[/:case_id], /api/create-case-from-email (protected)",
            "slots": "/api/cases/:case_id/slots, /api/slots/:slot_id (protected)",
            "users": "/api/users[/create], /api/users/:user_id/toggle-active (protected, admin)",
            "tenants": "/api/tenants/create (protected)",
            "admin": "/api/admin/* (super-admin)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "database_error": e.to_string()
            })),
        ),
    }
}
