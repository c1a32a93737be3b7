//! HTTP surface for TalkToDB.
//!
//! Exposes the generation and execution paths as JSON endpoints:
//! - `GET /` service banner
//! - `GET /docs` endpoint reference
//! - `GET /health` liveness
//! - `POST /generate-sql` question to SQL text
//! - `POST /run-query` SQL through the confirmation gate

mod error;
mod handlers;

pub use error::ErrorBody;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::llm::SqlGenerator;
use crate::query::QueryGate;

/// State shared by every handler. Nothing in it is mutated after startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: QueryGate,
    pub generator: SqlGenerator,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Arc<Config>, gate: QueryGate, generator: SqlGenerator) -> Self {
        Self {
            config,
            gate,
            generator,
        }
    }
}

/// Builds the router with CORS open to any origin, method and header.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/docs", get(handlers::docs))
        .route("/health", get(handlers::health))
        .route("/generate-sql", post(handlers::generate_sql))
        .route("/run-query", post(handlers::run_query))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::config(format!("Failed to bind {addr}: {e}")))?;

    info!(
        "TalkToDB listening on {} (database {}, model {})",
        addr,
        state.config.database.display_string(),
        state.generator.model()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::internal(format!("Server error: {e}")))?;

    info!("TalkToDB stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested, draining connections"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
