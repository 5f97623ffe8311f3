//! Request-scoped failures and the response envelope returned to callers.

use crate::types::Field;
use serde::{Deserialize, Serialize};

/// Every way a single analysis request can fail.
///
/// The `Display` text is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Invalid URL provided.")]
    InvalidUrl(String),

    #[error("No HTML content or URL provided.")]
    EmptyInput,

    #[error("Failed to fetch URL: {reason}")]
    Fetch { status: Option<u16>, reason: String },

    #[error("The provided HTML file is too large for the AI to process. Please try with a smaller file or a different URL.")]
    ContentTooLarge,

    #[error("Failed to detect any fields from the HTML.")]
    NoFieldsDetected,

    #[error("An error occurred during analysis. The HTML may be malformed, or the AI service may be temporarily unavailable.")]
    Analysis(String),
}

impl AnalysisError {
    /// Short machine-readable tag for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidUrl(_) => "invalid_url",
            AnalysisError::EmptyInput => "empty_input",
            AnalysisError::Fetch { .. } => "fetch",
            AnalysisError::ContentTooLarge => "content_too_large",
            AnalysisError::NoFieldsDetected => "no_fields_detected",
            AnalysisError::Analysis(_) => "analysis",
        }
    }
}

/// Whether an inference error reports that the input exceeded its token limit.
pub fn is_size_limit_error(message: &str) -> bool {
    message.to_lowercase().contains("token")
}

/// Tagged success/failure envelope for machine consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Field>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl From<Result<Vec<Field>, AnalysisError>> for AnalysisResponse {
    fn from(result: Result<Vec<Field>, AnalysisError>) -> Self {
        match result {
            Ok(fields) => Self {
                success: true,
                data: Some(fields),
                error: None,
                kind: None,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.to_string()),
                kind: Some(e.kind().to_string()),
            },
        }
    }
}
