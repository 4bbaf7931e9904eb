//! Application error types.
//!
//! Provides unified error handling with actionable context for debugging,
//! and maps errors onto the JSON bodies the HTTP API returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types with specific context for actionable debugging
#[derive(Debug, Error)]
pub enum Error {
    /// IO error with path context
    #[error("IO error at {path:?}: {source}")]
    Io {
        /// The underlying IO error.
        source: std::io::Error,
        /// File path where the error occurred, if known.
        path: Option<std::path::PathBuf>,
    },

    /// Configuration error with guidance
    #[error("Configuration error: {message}. {hint}")]
    Config {
        /// Description of the configuration problem.
        message: String,
        /// Actionable guidance for fixing the issue.
        hint: &'static str,
    },

    /// The Word template does not exist on disk
    #[error("Template file not found: {0:?}")]
    TemplateNotFound(std::path::PathBuf),

    /// The Word template is not a usable document
    #[error("Invalid template: {0}")]
    Template(String),

    /// Malformed document XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Unreadable or unwritable document archive
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The request is missing required data
    #[error("{0}")]
    BadRequest(&'static str),

    /// Generic message error (escape hatch)
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an IO error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<std::path::PathBuf>>) -> Self {
        Self::Io { source, path: path.into() }
    }

    /// Create a config error with actionable hint
    pub fn config(message: impl Into<String>, hint: &'static str) -> Self {
        Self::Config { message: message.into(), hint }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// HTTP status this error is reported with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::BadRequest(message) => json!({ "error": message }),
            Self::TemplateNotFound(_) => json!({ "error": "Template file not found" }),
            other => json!({
                "error": "Failed to generate Word document",
                "details": other.to_string(),
            }),
        };
        (self.status(), Json(body)).into_response()
    }
}

// Convenience conversions
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io { source: e, path: None }
    }
}
