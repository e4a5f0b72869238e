//! Error types for graph operations and their structured form for callers.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by the dependency graph engine.
///
/// Caller-fixable variants (see `is_caller_error`) are never retried.
/// `MissingTarget` reports as a validation error with the absent id in the
/// response details.
/// `GraphIntegrity` means the stored graph is corrupt and must surface as a
/// fatal error.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{0}")]
    Validation(String),

    #[error("target task does not exist")]
    MissingTarget(String),

    #[error("{0}")]
    Scope(String),

    #[error("dependency cycle detected among tasks: {}", .unresolved.join(", "))]
    GraphIntegrity { unresolved: Vec<String> },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GraphError {
    pub fn circular_dependency() -> Self {
        GraphError::Validation("would create circular dependency".to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GraphError::Validation(_) | GraphError::MissingTarget(_) => {
                ErrorCode::ValidationError
            }
            GraphError::Scope(_) => ErrorCode::ScopeError,
            GraphError::GraphIntegrity { .. } => ErrorCode::GraphIntegrityError,
            GraphError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            GraphError::Store(_) => ErrorCode::StoreError,
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GraphError::Validation(_)
                | GraphError::MissingTarget(_)
                | GraphError::Scope(_)
                | GraphError::TaskNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ScopeError,
    TaskNotFound,
    GraphIntegrityError,
    StoreError,
    InternalError,
}

/// Structured error envelope for interface layers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl From<&GraphError> for ErrorResponse {
    fn from(err: &GraphError) -> Self {
        let response = ErrorResponse::new(err.code(), err.to_string());
        match err {
            GraphError::Store(inner) => match inner.chain().nth(1) {
                Some(cause) => response.with_details(cause.to_string()),
                None => response,
            },
            GraphError::MissingTarget(task_id) => response.with_details(task_id.clone()),
            _ => response,
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

// Binaries work in anyhow; recover the graph error if there is one.
impl From<anyhow::Error> for ErrorResponse {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<GraphError>() {
            Ok(graph_err) => ErrorResponse::from(&graph_err),
            Err(err) => ErrorResponse::internal(err),
        }
    }
}
