// paper-agents - arXiv search and PDF text extraction agents

pub mod agents;
pub mod config;
pub mod documents;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;   // Paper index (arXiv Atom API)
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
