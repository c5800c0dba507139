//! Search Module
//!
//! Paper index abstraction used by the search agent, plus the arXiv Atom API
//! client that backs it in production.

pub mod arxiv;

pub use arxiv::ArxivClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by a paper index.
#[derive(Debug, Clone, Error)]
pub enum IndexError {
    /// The request never produced a response (connect, timeout, DNS, body read).
    #[error("{0}")]
    Transport(String),

    #[error("arXiv API returned HTTP {0}")]
    Status(u16),

    /// arXiv reports query errors as a feed entry rather than a status code.
    #[error("arXiv API error: {0}")]
    Api(String),

    #[error("failed to parse arXiv feed: {0}")]
    Feed(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Sort field understood by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriterion {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortCriterion {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortCriterion::Relevance => "relevance",
            SortCriterion::LastUpdatedDate => "lastUpdatedDate",
            SortCriterion::SubmittedDate => "submittedDate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// One search request against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub max_results: usize,
    pub sort_by: SortCriterion,
    pub sort_order: SortOrder,
}

impl SearchQuery {
    /// Newest submissions first.
    pub fn newest_first(text: impl Into<String>, max_results: usize) -> Self {
        Self {
            text: text.into(),
            max_results,
            sort_by: SortCriterion::SubmittedDate,
            sort_order: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitLink {
    pub href: String,
    pub rel: Option<String>,
    pub title: Option<String>,
    pub content_type: Option<String>,
}

/// Raw entry returned by the index, before it becomes a `PaperRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperHit {
    /// Entry identifier, e.g. `http://arxiv.org/abs/2303.10130v1`.
    pub entry_id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub links: Vec<HitLink>,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub primary_category: String,
    pub categories: Vec<String>,
}

impl PaperHit {
    /// Link titled `pdf`, or failing that the first link typed as PDF.
    pub fn pdf_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.title.as_deref() == Some("pdf"))
            .or_else(|| {
                self.links
                    .iter()
                    .find(|l| l.content_type.as_deref() == Some("application/pdf"))
            })
            .map(|l| l.href.as_str())
    }
}

/// An academic paper index.
#[async_trait]
pub trait PaperIndex: Send + Sync {
    /// Run one query. Hits come back in the index's own order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PaperHit>, IndexError>;
}
