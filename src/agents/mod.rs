//! Agent System
//!
//! Task-execution agents for the paper search workflow:
//!
//! - **Search Agent**: queries the arXiv index and returns paper metadata
//! - **Extraction Agent**: downloads a PDF and returns its plain text
//!
//! Both implement [`Agent`]: a task input object goes in, an [`AgentOutput`]
//! envelope comes out. Nothing is ever returned as an `Err` or a panic; every
//! failure is folded into the envelope.
//!
//! ## Pipeline Overview
//!
//! ```text
//!  Queries
//!     │
//!     ▼
//! ┌─────────────┐
//! │   Search    │  → papers (arxiv_id, pdf_url, ...)
//! │   Agent     │
//! └─────────────┘
//!     │  pdf_url per paper
//!     ▼
//! ┌─────────────┐
//! │ Extraction  │  → extracted_text
//! │   Agent     │
//! └─────────────┘
//!     │
//!     ▼
//!  PipelineReport
//! ```

pub mod extraction;
pub mod pipeline;
pub mod search;

pub use extraction::{ExtractedDocument, ExtractionAgent};
pub use pipeline::{run_search_and_extract, PipelineOptions};
pub use search::SearchAgent;

use crate::types::{AgentError, AgentOutput, TaskInput};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::instrument::WithSubscriber;
use tracing::{error, Dispatch};

/// A single-operation task agent.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, input: &TaskInput) -> AgentOutput;
}

/// Drive an agent body to completion under its log sink.
///
/// A panic inside the body is reported as an unexpected error instead of
/// unwinding into the caller.
pub(crate) async fn run_guarded<F>(agent: &'static str, sink: Option<&Dispatch>, body: F) -> AgentOutput
where
    F: Future<Output = AgentOutput> + Send,
{
    let guarded = AssertUnwindSafe(body).catch_unwind().map(move |result| {
        result.unwrap_or_else(|panic| {
            let detail = panic_message(panic.as_ref());
            error!(agent, detail = %detail, "Agent panicked");
            AgentOutput::failure(AgentError::Unexpected(detail))
        })
    });

    match sink {
        Some(dispatch) => guarded.with_subscriber(dispatch.clone()).await,
        None => guarded.await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}

/// Required non-empty string field.
pub(crate) fn required_str<'a>(
    input: &'a TaskInput,
    key: &str,
    missing_message: &str,
) -> Result<&'a str, AgentError> {
    match input.get(key) {
        None | Some(Value::Null) => Err(AgentError::Validation(missing_message.to_string())),
        Some(Value::String(s)) if s.is_empty() => Err(AgentError::Validation(missing_message.to_string())),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(AgentError::Validation(format!(
            "'{key}' must be a string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Optional positive integer field.
pub(crate) fn optional_count(input: &TaskInput, key: &str) -> Result<Option<usize>, AgentError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) if v > 0 => usize::try_from(v)
                .map(Some)
                .map_err(|_| AgentError::Validation(format!("'{key}' is too large"))),
            _ => Err(AgentError::Validation(format!("'{key}' must be a positive integer"))),
        },
        Some(other) => Err(AgentError::Validation(format!(
            "'{key}' must be a positive integer, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a task input from a `json!` object literal.
pub fn task_input(value: Value) -> TaskInput {
    match value {
        Value::Object(map) => map,
        _ => TaskInput::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use crate::utils::capture::LogCapture;
    use serde_json::json;

    #[test]
    fn test_required_str_rejects_missing_and_empty() {
        let missing = "'query' is required for Arxiv search.";
        for input in [json!({}), json!({"query": ""}), json!({"query": null})] {
            let err = required_str(&task_input(input), "query", missing).unwrap_err();
            assert_eq!(err, AgentError::Validation(missing.to_string()));
        }
    }

    #[test]
    fn test_required_str_rejects_wrong_type() {
        let err = required_str(&task_input(json!({"query": 42})), "query", "missing").unwrap_err();
        assert_eq!(err.to_string(), "'query' must be a string, got number");
    }

    #[test]
    fn test_optional_count() {
        assert_eq!(optional_count(&task_input(json!({})), "max_results").unwrap(), None);
        assert_eq!(
            optional_count(&task_input(json!({"max_results": 3})), "max_results").unwrap(),
            Some(3)
        );
        for bad in [json!({"max_results": 0}), json!({"max_results": -1}), json!({"max_results": 2.5}), json!({"max_results": "5"})] {
            let err = optional_count(&task_input(bad), "max_results").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_run_guarded_turns_panic_into_unexpected() {
        let capture = LogCapture::new();
        let dispatch = capture.dispatch();
        let output = run_guarded("test", Some(&dispatch), async {
            if capture.contents().is_empty() {
                panic!("parser blew up");
            }
            AgentOutput::ok(TaskInput::new())
        })
        .await;

        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Unexpected));
        assert_eq!(
            output.error_message.as_deref(),
            Some("An unexpected error occurred: parser blew up")
        );
        assert!(capture.contents().contains("Agent panicked"));
    }
}
