//! Extraction Agent
//!
//! Downloads a PDF and returns the text of all of its pages, concatenated in
//! page order. Image-only or empty documents are a successful outcome with no
//! text, not a failure.

use super::{required_str, run_guarded, Agent};
use crate::config::Config;
use crate::documents::{DocumentError, DocumentFetcher, DocumentParser, FetchError, HttpFetcher, PdfParser};
use crate::types::{AgentError, AgentOutput, TaskInput};
use async_trait::async_trait;
use serde_json::{json, Map};
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, warn, Dispatch};

const MISSING_URL: &str = "'pdf_url' is required for content extraction.";
const NO_TEXT: &str = "No text content found in PDF.";

/// Text pulled out of one downloaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pdf_url: String,
    pub text: String,
}

impl ExtractedDocument {
    /// True when the document yielded nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub struct ExtractionAgent {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn DocumentParser>,
    log_sink: Option<Dispatch>,
}

impl ExtractionAgent {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, parser: Arc<dyn DocumentParser>) -> Self {
        Self {
            fetcher,
            parser,
            log_sink: None,
        }
    }

    /// Agent that downloads over HTTP and parses with lopdf.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(HttpFetcher::new(config.http.user_agent.clone())),
            Arc::new(PdfParser::new()),
        )
    }

    pub fn with_log_sink(mut self, dispatch: Dispatch) -> Self {
        self.log_sink = Some(dispatch);
        self
    }

    /// Download `pdf_url` and extract its text.
    pub async fn extract(&self, pdf_url: &str) -> Result<ExtractedDocument, AgentError> {
        if pdf_url.is_empty() {
            error!("Rejected extraction with empty pdf_url");
            return Err(AgentError::Validation(MISSING_URL.to_string()));
        }

        info!(pdf_url = %pdf_url, "Downloading PDF");

        let bytes = self.fetcher.fetch(pdf_url).await.map_err(|e| match e {
            FetchError::Status { status, url } => {
                error!(pdf_url = %pdf_url, status, url = %url, "HTTP error while downloading PDF");
                AgentError::HttpStatus { status, url }
            }
            FetchError::Transport(detail) => {
                error!(pdf_url = %pdf_url, error = %detail, "Network error while downloading PDF");
                AgentError::Network {
                    action: "downloading PDF",
                    detail,
                }
            }
            FetchError::Other(detail) => {
                error!(pdf_url = %pdf_url, error = %detail, "Unexpected error while downloading PDF");
                AgentError::Unexpected(detail)
            }
        })?;

        info!(pdf_url = %pdf_url, bytes = bytes.len(), "Downloaded PDF");

        // Parsing is CPU-bound; the bytes move into the blocking task and are dropped there.
        let parser = Arc::clone(&self.parser);
        let parsed = task::spawn_blocking(move || parser.extract_text(&bytes)).await;

        let text = match parsed {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                error!(pdf_url = %pdf_url, error = %e, "Failed to parse PDF");
                return Err(map_document_error(e));
            }
            Err(e) if e.is_panic() => {
                error!(pdf_url = %pdf_url, "PDF parser panicked");
                return Err(AgentError::Unexpected("PDF parser panicked".to_string()));
            }
            Err(e) => {
                error!(pdf_url = %pdf_url, error = %e, "PDF parse task failed");
                return Err(AgentError::Unexpected(e.to_string()));
            }
        };

        Ok(ExtractedDocument {
            pdf_url: pdf_url.to_string(),
            text,
        })
    }

    async fn run(&self, input: &TaskInput) -> AgentOutput {
        let pdf_url = match required_str(input, "pdf_url", MISSING_URL) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Rejected extraction task input");
                return AgentOutput::failure(e);
            }
        };

        let document = match self.extract(pdf_url).await {
            Ok(document) => document,
            Err(e) => return AgentOutput::failure(e),
        };

        let mut data = Map::new();
        if document.is_blank() {
            warn!(pdf_url = %pdf_url, "No text extracted from PDF; it may be image-based or empty");
            data.insert("extracted_text".to_string(), json!(""));
            data.insert("message".to_string(), json!(NO_TEXT));
            return AgentOutput::ok(data);
        }

        info!(pdf_url = %pdf_url, chars = document.text.chars().count(), "Extracted text from PDF");
        data.insert("extracted_text".to_string(), json!(document.text));
        data.insert("pdf_url".to_string(), json!(document.pdf_url));
        AgentOutput::ok(data)
    }
}

fn map_document_error(e: DocumentError) -> AgentError {
    AgentError::DocumentParse(e.to_string())
}

#[async_trait]
impl Agent for ExtractionAgent {
    fn name(&self) -> &'static str {
        "content_extraction"
    }

    async fn execute(&self, input: &TaskInput) -> AgentOutput {
        run_guarded(self.name(), self.log_sink.as_ref(), self.run(input)).await
    }
}
