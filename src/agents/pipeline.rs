//! Search-then-extract pipeline
//!
//! Chains the two agents through their envelopes only: every query goes to
//! the search agent, every paper it returns with a `pdf_url` goes to the
//! extraction agent. Per-paper failures are recorded and the run moves on.

use super::Agent;
use crate::config::PipelineConfig;
use crate::models::{PaperOutcome, PaperRecord, PaperStatus, PipelineReport, SkippedQuery};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub max_papers_per_query: usize,
    /// Pause between consecutive downloads.
    pub request_delay: Duration,
    pub include_text: bool,
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_papers_per_query: config.max_papers_per_query,
            request_delay: Duration::from_millis(config.request_delay_ms),
            include_text: false,
        }
    }
}

/// Run every query through search, then extraction for each paper found.
pub async fn run_search_and_extract(
    search: &dyn Agent,
    extraction: &dyn Agent,
    queries: &[String],
    options: &PipelineOptions,
) -> PipelineReport {
    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, queries = queries.len(), "Starting search pipeline");

    let mut outcomes = Vec::new();
    let mut skipped_queries = Vec::new();
    let mut downloads = 0usize;

    for (query_idx, query) in queries.iter().enumerate() {
        info!(run_id = %run_id, query = %query, "Processing query {}/{}", query_idx + 1, queries.len());

        let input = super::task_input(json!({
            "query": query,
            "max_results": options.max_papers_per_query,
        }));
        let output = search.execute(&input).await;

        if !output.success {
            let reason = output
                .error_message
                .unwrap_or_else(|| "search failed".to_string());
            error!(run_id = %run_id, query = %query, error = %reason, "Search failed, skipping query");
            skipped_queries.push(SkippedQuery {
                query: query.clone(),
                reason,
            });
            continue;
        }

        let papers: Vec<PaperRecord> = match output.get("papers").cloned().map(serde_json::from_value::<Vec<PaperRecord>>) {
            Some(Ok(papers)) => papers,
            Some(Err(e)) => {
                error!(run_id = %run_id, query = %query, error = %e, "Search returned unreadable papers");
                skipped_queries.push(SkippedQuery {
                    query: query.clone(),
                    reason: format!("unreadable search payload: {e}"),
                });
                continue;
            }
            None => Vec::new(),
        };

        if papers.is_empty() {
            info!(run_id = %run_id, query = %query, "No papers found, skipping query");
            skipped_queries.push(SkippedQuery {
                query: query.clone(),
                reason: "No papers found.".to_string(),
            });
            continue;
        }

        for paper in papers {
            let Some(pdf_url) = paper.pdf_url.clone() else {
                warn!(run_id = %run_id, arxiv_id = %paper.arxiv_id, "No PDF URL, skipping extraction");
                outcomes.push(outcome(query, &paper, PaperStatus::SkippedNoPdfUrl, Some("No PDF URL provided by Arxiv.".to_string())));
                continue;
            };

            if downloads > 0 && !options.request_delay.is_zero() {
                tokio::time::sleep(options.request_delay).await;
            }
            downloads += 1;

            let output = extraction
                .execute(&super::task_input(json!({ "pdf_url": pdf_url })))
                .await;

            let text = output
                .get("extracted_text")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            match (output.success, text) {
                (true, Some(text)) => {
                    info!(run_id = %run_id, arxiv_id = %paper.arxiv_id, chars = text.len(), "Extracted paper text");
                    let mut record = outcome(query, &paper, PaperStatus::Extracted, None);
                    record.extracted_chars = Some(text.chars().count());
                    if options.include_text {
                        record.extracted_text = Some(text);
                    }
                    outcomes.push(record);
                }
                (_, _) => {
                    let reason = output
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "Content extraction failed or returned no text.".to_string());
                    error!(run_id = %run_id, arxiv_id = %paper.arxiv_id, error = %reason, "Extraction failed");
                    outcomes.push(outcome(query, &paper, PaperStatus::FailedExtraction, Some(reason)));
                }
            }
        }
    }

    let report = PipelineReport {
        run_id,
        outcomes,
        skipped_queries,
    };
    info!(
        run_id = %run_id,
        processed = report.outcomes.len(),
        extracted = report.extracted_count(),
        "Search pipeline finished"
    );
    report
}

fn outcome(query: &str, paper: &PaperRecord, status: PaperStatus, error: Option<String>) -> PaperOutcome {
    PaperOutcome {
        query: query.to_string(),
        arxiv_id: paper.arxiv_id.clone(),
        title: paper.title.clone(),
        pdf_url: paper.pdf_url.clone(),
        status,
        extracted_chars: None,
        extracted_text: None,
        error,
    }
}
