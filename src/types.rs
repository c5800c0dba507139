// Shared envelope and error taxonomy

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input handed to an agent: a JSON object with string keys.
pub type TaskInput = Map<String, Value>;

/// Tag for each failure category an agent can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Network,
    HttpStatus,
    DocumentParse,
    Unexpected,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::HttpStatus => write!(f, "http_status"),
            ErrorKind::DocumentParse => write!(f, "document_parse"),
            ErrorKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Failures surfaced at the agent boundary.
///
/// Collaborator errors (index client, HTTP client, PDF parser) are mapped onto
/// these variants before they reach the caller; the `Display` text is what ends
/// up in [`AgentOutput::error_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error {action}: {detail}")]
    Network { action: &'static str, detail: String },

    #[error("HTTP error {status} downloading PDF: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Error processing PDF content: {0}")]
    DocumentParse(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Validation(_) => ErrorKind::Validation,
            AgentError::Network { .. } => ErrorKind::Network,
            AgentError::HttpStatus { .. } => ErrorKind::HttpStatus,
            AgentError::DocumentParse(_) => ErrorKind::DocumentParse,
            AgentError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }
}

/// Uniform result envelope returned by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl AgentOutput {
    /// Successful outcome carrying a payload.
    pub fn ok(data: Map<String, Value>) -> Self {
        Self {
            success: true,
            error_message: None,
            error_kind: None,
            data: Some(data),
        }
    }

    pub fn failure(error: AgentError) -> Self {
        Self {
            success: false,
            error_message: Some(error.to_string()),
            error_kind: Some(error.kind()),
            data: None,
        }
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}

impl From<AgentError> for AgentOutput {
    fn from(error: AgentError) -> Self {
        Self::failure(error)
    }
}

/// Errors raised by the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
