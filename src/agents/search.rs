//! Search Agent
//!
//! Looks up papers in the arXiv index by keyword, newest submissions first,
//! and returns normalised [`PaperRecord`]s in the index's own order.

use super::{optional_count, required_str, run_guarded, Agent};
use crate::config::Config;
use crate::models::PaperRecord;
use crate::search::{ArxivClient, IndexError, PaperIndex, SearchQuery};
use crate::types::{AgentError, AgentOutput, TaskInput};
use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::Arc;
use tracing::{error, info, Dispatch};

const MISSING_QUERY: &str = "'query' is required for Arxiv search.";
const NO_RESULTS: &str = "No papers found.";

pub struct SearchAgent {
    index: Arc<dyn PaperIndex>,
    default_max_results: usize,
    log_sink: Option<Dispatch>,
}

impl SearchAgent {
    pub fn new(index: Arc<dyn PaperIndex>, default_max_results: usize) -> Self {
        Self {
            index,
            default_max_results,
            log_sink: None,
        }
    }

    /// Agent backed by the arXiv API described in `config`.
    pub fn from_config(config: &Config) -> Result<Self, IndexError> {
        let client = ArxivClient::new(&config.search, &config.http.user_agent)?;
        Ok(Self::new(Arc::new(client), config.search.max_results))
    }

    /// Route this agent's logs to `dispatch` instead of the global subscriber.
    pub fn with_log_sink(mut self, dispatch: Dispatch) -> Self {
        self.log_sink = Some(dispatch);
        self
    }

    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    /// Typed search: one index call, hits mapped in order.
    pub async fn search_papers(&self, query: &str, max_results: usize) -> Result<Vec<PaperRecord>, AgentError> {
        if query.is_empty() {
            error!("Rejected search with empty query");
            return Err(AgentError::Validation(MISSING_QUERY.to_string()));
        }

        info!(query = %query, max_results, "Searching arXiv");

        let request = SearchQuery::newest_first(query, max_results);
        match self.index.search(&request).await {
            Ok(hits) => Ok(hits.iter().map(PaperRecord::from_hit).collect()),
            Err(IndexError::Transport(detail)) => {
                error!(query = %query, error = %detail, "Network error during arXiv search");
                Err(AgentError::Network {
                    action: "during Arxiv search",
                    detail,
                })
            }
            Err(e) => {
                error!(query = %query, error = %e, "Unexpected error during arXiv search");
                Err(AgentError::Unexpected(e.to_string()))
            }
        }
    }

    async fn run(&self, input: &TaskInput) -> AgentOutput {
        let (query, max_results) = match parse_input(input, self.default_max_results) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "Rejected search task input");
                return AgentOutput::failure(e);
            }
        };

        let papers = match self.search_papers(query, max_results).await {
            Ok(papers) => papers,
            Err(e) => return AgentOutput::failure(e),
        };

        let mut data = Map::new();
        if papers.is_empty() {
            info!(query = %query, "No papers found");
            data.insert("papers".to_string(), json!([]));
            data.insert("message".to_string(), json!(NO_RESULTS));
            return AgentOutput::ok(data);
        }

        info!(query = %query, count = papers.len(), "Found papers");
        match serde_json::to_value(&papers) {
            Ok(value) => {
                data.insert("papers".to_string(), value);
                AgentOutput::ok(data)
            }
            Err(e) => {
                error!(error = %e, "Failed to serialise paper records");
                AgentOutput::failure(AgentError::Unexpected(e.to_string()))
            }
        }
    }
}

fn parse_input(input: &TaskInput, default_max_results: usize) -> Result<(&str, usize), AgentError> {
    let query = required_str(input, "query", MISSING_QUERY)?;
    let max_results = optional_count(input, "max_results")?.unwrap_or(default_max_results);
    Ok((query, max_results))
}

#[async_trait]
impl Agent for SearchAgent {
    fn name(&self) -> &'static str {
        "arxiv_search"
    }

    async fn execute(&self, input: &TaskInput) -> AgentOutput {
        run_guarded(self.name(), self.log_sink.as_ref(), self.run(input)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agents::task_input;
    use crate::search::{HitLink, PaperHit, SortCriterion, SortOrder};
    use crate::types::ErrorKind;
    use crate::utils::capture::LogCapture;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;
    use tracing::instrument::WithSubscriber;

    /// Index double that records every query it receives.
    pub(crate) struct FakeIndex {
        response: Result<Vec<PaperHit>, IndexError>,
        pub(crate) calls: Mutex<Vec<SearchQuery>>,
    }

    impl FakeIndex {
        pub(crate) fn returning(hits: Vec<PaperHit>) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(hits),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing(err: IndexError) -> Arc<Self> {
            Arc::new(Self {
                response: Err(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaperIndex for FakeIndex {
        async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperHit>, IndexError> {
            self.calls.lock().unwrap().push(query.clone());
            self.response.clone()
        }
    }

    pub(crate) fn hit(id: &str, title: &str, with_pdf: bool) -> PaperHit {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut links = vec![HitLink {
            href: format!("http://arxiv.org/abs/{id}"),
            rel: Some("alternate".to_string()),
            title: None,
            content_type: Some("text/html".to_string()),
        }];
        if with_pdf {
            links.push(HitLink {
                href: format!("http://arxiv.org/pdf/{id}"),
                rel: Some("related".to_string()),
                title: Some("pdf".to_string()),
                content_type: Some("application/pdf".to_string()),
            });
        }
        PaperHit {
            entry_id: format!("http://arxiv.org/abs/{id}"),
            title: title.to_string(),
            summary: format!("Abstract of {title}"),
            authors: vec!["Author A".to_string(), "Author B".to_string()],
            links,
            published,
            updated: published + Duration::days(1),
            primary_category: "cs.AI".to_string(),
            categories: vec!["cs.AI".to_string(), "cs.LG".to_string()],
        }
    }

    #[tokio::test]
    async fn test_missing_query_makes_no_call() {
        let index = FakeIndex::returning(vec![]);
        let agent = SearchAgent::new(index.clone(), 10);

        for input in [json!({}), json!({"query": ""}), json!({"max_results": 3})] {
            let output = agent.execute(&task_input(input)).await;
            assert!(!output.success);
            assert_eq!(output.error_kind, Some(ErrorKind::Validation));
            assert_eq!(output.error_message.as_deref(), Some(MISSING_QUERY));
            assert!(output.data.is_none());
        }
        assert_eq!(index.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_max_results_makes_no_call() {
        let index = FakeIndex::returning(vec![]);
        let agent = SearchAgent::new(index.clone(), 10);

        let output = agent
            .execute(&task_input(json!({"query": "agents", "max_results": "ten"})))
            .await;

        assert_eq!(output.error_kind, Some(ErrorKind::Validation));
        assert_eq!(index.call_count(), 0);
    }

    #[tokio::test]
    async fn test_query_uses_default_cap_and_newest_first() {
        let index = FakeIndex::returning(vec![]);
        let agent = SearchAgent::new(index.clone(), 7);

        agent.execute(&task_input(json!({"query": "LLM agents"}))).await;

        let calls = index.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "LLM agents");
        assert_eq!(calls[0].max_results, 7);
        assert_eq!(calls[0].sort_by, SortCriterion::SubmittedDate);
        assert_eq!(calls[0].sort_order, SortOrder::Descending);
    }

    #[tokio::test]
    async fn test_explicit_cap_overrides_default() {
        let index = FakeIndex::returning(vec![]);
        let agent = SearchAgent::new(index.clone(), 10);

        agent
            .execute(&task_input(json!({"query": "agents", "max_results": 3})))
            .await;

        assert_eq!(index.calls.lock().unwrap()[0].max_results, 3);
    }

    #[tokio::test]
    async fn test_zero_hits_is_success_with_message() {
        let agent = SearchAgent::new(FakeIndex::returning(vec![]), 10);

        let output = agent
            .execute(&task_input(json!({"query": "nonexistenttopicxyz123"})))
            .await;

        assert!(output.success);
        assert!(output.error_message.is_none());
        assert_eq!(output.get("papers"), Some(&json!([])));
        assert_eq!(output.get("message"), Some(&json!(NO_RESULTS)));
    }

    #[tokio::test]
    async fn test_hits_become_records_in_index_order() {
        let hits = vec![
            hit("2405.00003v1", "Newest", true),
            hit("2405.00001v2", "Middle", true),
            hit("2404.00009v1", "Oldest", false),
        ];
        let agent = SearchAgent::new(FakeIndex::returning(hits), 10);

        let output = agent.execute(&task_input(json!({"query": "agents"}))).await;
        assert!(output.success);
        assert!(output.get("message").is_none());

        let papers: Vec<PaperRecord> =
            serde_json::from_value(output.get("papers").cloned().unwrap()).unwrap();
        assert_eq!(papers.len(), 3);

        let ids: Vec<&str> = papers.iter().map(|p| p.arxiv_id.as_str()).collect();
        assert_eq!(ids, vec!["2405.00003v1", "2405.00001v2", "2404.00009v1"]);

        let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);

        assert_eq!(papers[0].pdf_url.as_deref(), Some("http://arxiv.org/pdf/2405.00003v1"));
        assert_eq!(papers[2].pdf_url, None);
        assert_eq!(papers[0].authors, vec!["Author A", "Author B"]);
        assert_eq!(papers[0].published_date, "2024-05-01T12:00:00+00:00");
        assert_eq!(papers[0].updated_date, "2024-05-02T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let capture = LogCapture::new();
        let agent = SearchAgent::new(
            FakeIndex::failing(IndexError::Transport("connection refused".to_string())),
            10,
        )
        .with_log_sink(capture.dispatch());

        let output = agent.execute(&task_input(json!({"query": "agents"}))).await;

        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Network));
        assert_eq!(
            output.error_message.as_deref(),
            Some("Network error during Arxiv search: connection refused")
        );
        assert!(capture.contents().contains("Network error during arXiv search"));
    }

    #[tokio::test]
    async fn test_other_index_failures_are_unexpected() {
        for err in [
            IndexError::Status(500),
            IndexError::Feed("truncated".to_string()),
            IndexError::Api("incorrect id format".to_string()),
        ] {
            let expected = format!("An unexpected error occurred: {err}");
            let agent = SearchAgent::new(FakeIndex::failing(err), 10);
            let output = agent.execute(&task_input(json!({"query": "agents"}))).await;

            assert_eq!(output.error_kind, Some(ErrorKind::Unexpected));
            assert_eq!(output.error_message, Some(expected));
        }
    }

    #[tokio::test]
    async fn test_repeated_search_is_idempotent() {
        let agent = SearchAgent::new(
            FakeIndex::returning(vec![hit("2405.00003v1", "Newest", true)]),
            10,
        );
        let input = task_input(json!({"query": "agents", "max_results": 1}));

        let first = agent.execute(&input).await;
        let second = agent.execute(&input).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_search_papers_typed_api() {
        let agent = SearchAgent::new(FakeIndex::returning(vec![hit("2401.1v1", "T", true)]), 10);
        let papers = tokio_test::assert_ok!(agent.search_papers("agents", 5).await);
        assert_eq!(papers[0].arxiv_id, "2401.1v1");

        let err = tokio_test::assert_err!(agent.search_papers("", 5).await);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_typed_empty_query_is_logged() {
        let capture = LogCapture::new();
        let index = FakeIndex::returning(vec![]);
        let agent = SearchAgent::new(index.clone(), 10);

        let result = agent.search_papers("", 5).with_subscriber(capture.dispatch()).await;

        assert!(result.is_err());
        assert_eq!(index.call_count(), 0);
        assert!(capture.contents().contains("Rejected search with empty query"));
    }
}
