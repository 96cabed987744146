//! Harmony Sermon Notes Backend
//!
//! A small REST backend that owns the sermon library, the single live
//! designation, and per-sermon attendee annotations, persisted to SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Harmony Sermon Notes Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin credential is not configured
    if config.admin_password.is_none() {
        tracing::warn!(
            "No admin password configured (HARMONY_ADMIN_PASSWORD). Admin login is disabled."
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the credential for the gate layer
    let admin_password = state.config.admin_password.clone();

    // Reader routes: the congregation's view, no credential required.
    // Annotations are the attendee's own notes, so they are writable here.
    let reader_routes = Router::new()
        // Library
        .route("/library", get(api::get_library))
        .route("/library/revision", get(api::get_revision))
        // Sermons
        .route("/sermons", get(api::list_sermons))
        .route("/sermons/live", get(api::get_live_sermon))
        .route("/sermons/{id}", get(api::get_sermon))
        // Annotations
        .route("/sermons/{id}/notes", get(api::load_annotations))
        .route("/sermons/{id}/notes", put(api::save_annotations))
        .route("/sermons/{id}/notes/export", get(api::export_annotations))
        // Logo
        .route("/logo", get(api::get_logo))
        // Login check
        .route("/auth/login", post(api::login));

    // Admin routes: mutations of the shared library, behind the gate.
    let admin_routes = Router::new()
        .route("/sermons", post(api::create_sermon))
        .route("/sermons/{id}", put(api::update_sermon))
        .route("/sermons/{id}/live", post(api::set_live_sermon))
        .route("/logo", put(api::set_logo))
        .route("/logo", delete(api::remove_logo))
        // Apply the admin gate middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(admin_password.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", reader_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
