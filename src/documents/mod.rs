//! Document Module
//!
//! Collaborators used by the extraction agent: something that downloads a
//! document by URL and something that turns the downloaded bytes into
//! per-page text.

pub mod http;
pub mod pdf;

pub use http::HttpFetcher;
pub use pdf::PdfParser;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors raised while downloading a document.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status} for url ({url})")]
    Status { status: u16, url: String },

    /// No usable response: timeout, refused connection, DNS, broken body.
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while decoding a document.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Malformed(String),

    #[error("failed to extract text from page {page}: {detail}")]
    Page { page: u32, detail: String },
}

/// Downloads a document body.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Opens a paginated document held in memory.
pub trait DocumentParser: Send + Sync {
    /// Text of every page, in page order.
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError>;

    /// Page texts joined with no separator between pages.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        Ok(self.page_texts(bytes)?.concat())
    }
}
