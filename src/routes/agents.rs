use axum::{
    Router,
    routing::post,
    Json,
    extract::State,
};
use crate::agents::{run_search_and_extract, PipelineOptions};
use crate::models::{AppState, PipelineReport, PipelineRequest};
use crate::types::{AgentOutput, AppError, AppResult, TaskInput};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agents/search", post(search))
        .route("/api/agents/extract", post(extract))
        .route("/api/pipeline", post(pipeline))
        .with_state(state)
}

// Agent failures are reported inside the envelope, so these always answer 200.
async fn search(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> Json<AgentOutput> {
    info!("Received search task");
    Json(state.search.execute(&input).await)
}

async fn extract(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> Json<AgentOutput> {
    info!("Received extraction task");
    Json(state.extraction.execute(&input).await)
}

async fn pipeline(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> AppResult<Json<PipelineReport>> {
    let queries: Vec<String> = request
        .queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if queries.is_empty() {
        return Err(AppError::InvalidRequest("at least one query is required".to_string()));
    }

    let mut options = PipelineOptions::from(&state.config.pipeline);
    if let Some(max) = request.max_papers_per_query {
        if max == 0 {
            return Err(AppError::InvalidRequest("max_papers_per_query must be positive".to_string()));
        }
        options.max_papers_per_query = max;
    }
    options.include_text = request.include_text;

    info!(queries = queries.len(), "Received pipeline request");
    let report = run_search_and_extract(
        state.search.as_ref(),
        state.extraction.as_ref(),
        &queries,
        &options,
    )
    .await;

    Ok(Json(report))
}
