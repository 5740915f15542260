//! HTTP API server

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{Authenticator, CredentialStore, SessionManager};
use crate::config::Config;
use crate::error::Result;
use crate::kb::KnowledgeBase;

use super::routes;

/// How often stale sessions are swept from memory
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub authenticator: Authenticator,
    pub sessions: SessionManager,
    pub kb: KnowledgeBase,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let store = CredentialStore::from_config(&config.auth)?;
        Ok(Self::new(config, store))
    }

    pub fn new(config: Config, store: CredentialStore) -> Self {
        let sessions = SessionManager::with_timeout(config.auth.session_timeout());
        Self {
            config,
            authenticator: Authenticator::new(store),
            sessions,
            kb: KnowledgeBase::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    tracing::info!(
        users = state.authenticator.store().len(),
        timeout_hours = state.config.auth.session_timeout_hours,
        "Authentication ready"
    );

    spawn_session_cleanup(state.clone());

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically forget sessions that expired more than one timeout ago
fn spawn_session_cleanup(state: SharedState) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));
        let grace: Duration = state.config.auth.session_timeout();
        loop {
            interval.tick().await;
            let removed = state.sessions.cleanup_expired(Utc::now(), grace).await;
            if removed > 0 {
                tracing::debug!(removed, "Swept stale sessions");
            }
        }
    });
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        // Session lifecycle
        .route("/api/login", post(routes::login))
        .route("/api/logout", post(routes::logout))
        .route("/api/session", get(routes::current_session))
        // Pages
        .route("/api/pages", get(routes::list_pages))
        .route("/api/pages/{slug}", get(routes::get_page))
        // Knowledge base
        .route("/api/kb/search", get(routes::kb_search))
        .route("/api/kb/recent", get(routes::kb_recent))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
