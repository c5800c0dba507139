//! API Routes
//!
//! HTTP surface for an orchestrator that wants to call the agents remotely:
//! - `/api/agents/search` - Search agent (task input in, envelope out)
//! - `/api/agents/extract` - Extraction agent
//! - `/api/pipeline` - Search then extract for a list of queries
//! - `/api/health` - Health checks

pub mod agents;
pub mod health;

use axum::Router;
use crate::middleware::apply_cors;
use crate::models::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();
    let router = Router::new()
        .merge(agents::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &origins)
}
