use crate::agents::Agent;
use crate::config::Config;
use crate::search::PaperHit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub search: Arc<dyn Agent>,
    pub extraction: Arc<dyn Agent>,
}

/// Normalised metadata for one search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub arxiv_id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub pdf_url: Option<String>,
    pub published_date: String,
    pub updated_date: String,
    pub primary_category: String,
    pub categories: Vec<String>,
}

impl PaperRecord {
    pub fn from_hit(hit: &PaperHit) -> Self {
        Self {
            arxiv_id: arxiv_id_from_entry(&hit.entry_id).to_string(),
            title: hit.title.clone(),
            summary: hit.summary.clone(),
            authors: hit.authors.clone(),
            pdf_url: hit.pdf_url().map(String::from),
            published_date: hit.published.to_rfc3339(),
            updated_date: hit.updated.to_rfc3339(),
            primary_category: hit.primary_category.clone(),
            categories: hit.categories.clone(),
        }
    }
}

/// Last path segment of an entry id: `http://arxiv.org/abs/2303.10130v1` -> `2303.10130v1`.
pub fn arxiv_id_from_entry(entry_id: &str) -> &str {
    entry_id.rsplit('/').next().unwrap_or(entry_id)
}

/// What happened to one paper during a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Extracted,
    SkippedNoPdfUrl,
    FailedExtraction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperOutcome {
    pub query: String,
    pub arxiv_id: String,
    pub title: String,
    pub pdf_url: Option<String>,
    pub status: PaperStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A query that produced no papers to process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedQuery {
    pub query: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: uuid::Uuid,
    pub outcomes: Vec<PaperOutcome>,
    pub skipped_queries: Vec<SkippedQuery>,
}

impl PipelineReport {
    pub fn extracted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == PaperStatus::Extracted)
            .count()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineRequest {
    pub queries: Vec<String>,
    pub max_papers_per_query: Option<usize>,
    #[serde(default)]
    pub include_text: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}
