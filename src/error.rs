//! Custom error types and normalization
//!
//! `AppError` is the typed failure raised where a problem is detected.
//! `Failure` enumerates every failure shape an action can end with, and
//! [`error_handler`] folds any of them into the serializable [`HandledError`]
//! that callers receive.

use std::{backtrace::Backtrace, collections::BTreeMap, fmt, sync::OnceLock};

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::constants::messages;

/// Extra, user-presentable information attached to an error
pub type Metadata = BTreeMap<String, String>;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

static CAPTURE_STACKS: OnceLock<bool> = OnceLock::new();

/// Turn stack capture on or off for every `AppError` built afterwards.
///
/// Called once at startup; later calls are ignored.
pub fn enable_stack_capture(enabled: bool) {
    let _ = CAPTURE_STACKS.set(enabled);
}

fn stack_capture_enabled() -> bool {
    CAPTURE_STACKS.get().copied().unwrap_or(false)
}

/// Application error carrying a status classification and metadata
#[derive(Debug, Clone)]
pub struct AppError {
    message: String,
    status: StatusCode,
    error_type: &'static str,
    metadata: Metadata,
    stack: Option<String>,
}

impl AppError {
    /// Create an error with the given status.
    ///
    /// Statuses without a canonical reason phrase are not part of the known
    /// classification and are replaced by 500.
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        let (status, error_type) = match status.canonical_reason() {
            Some(reason) => (status, reason),
            None => internal_classification(),
        };

        let stack = stack_capture_enabled().then(capture_stack);

        Self {
            message: message.into(),
            status,
            error_type,
            metadata: Metadata::new(),
            stack,
        }
    }

    /// Create an error from an untyped classification such as `"404"`.
    ///
    /// Anything that is not a known numeric status yields 500.
    pub fn from_raw_status(message: impl Into<String>, raw: &str) -> Self {
        let status = raw
            .trim()
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        Self::new(message, status)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attach metadata that can be shown to users
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Capture a stack regardless of the process-wide setting
    pub fn with_stack(mut self) -> Self {
        self.stack = Some(capture_stack());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The HTTP status associated with the error
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase of the status, e.g. "Not Found"
    pub fn error_type(&self) -> &'static str {
        self.error_type
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Rendered stack, when one was captured
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

fn internal_classification() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

fn capture_stack() -> String {
    Backtrace::force_capture().to_string()
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        HandledError::from(&self).into_response()
    }
}

/// Normalized error record returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandledError {
    pub status_code: u16,
    pub message: String,
    pub error_type: String,
    pub data: Metadata,
}

impl From<&AppError> for HandledError {
    fn from(err: &AppError) -> Self {
        Self {
            status_code: err.status_code().as_u16(),
            message: err.message().to_string(),
            error_type: err.error_type().to_string(),
            data: err.metadata().clone(),
        }
    }
}

impl IntoResponse for HandledError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self)).into_response()
    }
}

/// Every way a unit of work can fail
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// A typed error raised by this application
    #[error(transparent)]
    App(#[from] AppError),

    /// A foreign failure that carries its own status classification
    #[error("rejected with status {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// Anything else; details are logged, never shown
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for Failure {
    fn from(err: sqlx::Error) -> Self {
        Failure::Unexpected(err.into())
    }
}

impl From<redis::RedisError> for Failure {
    fn from(err: redis::RedisError) -> Self {
        Failure::Unexpected(err.into())
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Unexpected(err.into())
    }
}

impl From<jsonwebtoken::errors::Error> for Failure {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Failure::Unexpected(err.into())
    }
}

impl From<JsonRejection> for Failure {
    fn from(rejection: JsonRejection) -> Self {
        Failure::Status {
            status: rejection.status(),
            message: Some(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for Failure {
    fn from(rejection: QueryRejection) -> Self {
        Failure::Status {
            status: rejection.status(),
            message: Some(rejection.body_text()),
        }
    }
}

/// Output of [`error_handler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub handled_error: HandledError,
    pub is_unknown_error: bool,
}

/// Normalize any failure into a [`HandledError`].
///
/// Typed errors pass through unchanged. Failures carrying their own status
/// become a 400 with their message; everything else becomes a generic 500.
/// Both of the latter are flagged as unknown.
pub fn error_handler(failure: &Failure) -> Normalized {
    match failure {
        Failure::App(err) => Normalized {
            handled_error: err.into(),
            is_unknown_error: false,
        },
        Failure::Status { message, .. } => {
            let message = message
                .as_deref()
                .filter(|m| !m.is_empty())
                .or(StatusCode::BAD_REQUEST.canonical_reason())
                .unwrap_or_default();

            Normalized {
                handled_error: (&AppError::bad_request(message)).into(),
                is_unknown_error: true,
            }
        }
        Failure::Unexpected(_) => Normalized {
            handled_error: (&AppError::internal(messages::UNKNOWN_ERROR)).into(),
            is_unknown_error: true,
        },
    }
}
