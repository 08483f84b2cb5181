//! Action wrapper
//!
//! Every public operation runs through [`catch_action`]. Ordinary failures
//! are normalized into a [`HandledError`] and returned as a value; control
//! signals (redirects) are not failures and pass through untouched so the
//! HTTP layer can act on them.

use std::future::Future;

use axum::response::{IntoResponse, Redirect, Response};
use futures::future::{BoxFuture, FutureExt};

use crate::{
    error::{error_handler, AppError, Failure, HandledError, Normalized},
    validation::ValidationFailure,
};

/// Outcome of a wrapped action.
///
/// The outer `Err` is a control signal for the hosting layer; the inner
/// `Err` is a normalized failure for the caller.
pub type ActionResult<T> = Result<Result<T, HandledError>, ControlSignal>;

/// Instructions for the hosting layer that end an action early
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Send the client to the given path
    Redirect(String),
}

impl IntoResponse for ControlSignal {
    fn into_response(self) -> Response {
        match self {
            ControlSignal::Redirect(path) => Redirect::to(&path).into_response(),
        }
    }
}

/// Why an action stopped before producing a value
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("control signal {0:?}")]
    Signal(ControlSignal),

    #[error(transparent)]
    Failed(#[from] Failure),
}

impl From<ControlSignal> for ActionError {
    fn from(signal: ControlSignal) -> Self {
        ActionError::Signal(signal)
    }
}

impl From<AppError> for ActionError {
    fn from(err: AppError) -> Self {
        ActionError::Failed(err.into())
    }
}

impl From<ValidationFailure> for ActionError {
    fn from(failure: ValidationFailure) -> Self {
        ActionError::Failed(failure.into())
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        ActionError::Failed(err.into())
    }
}

/// End the current action with a redirect to `path`
pub fn redirect(path: impl Into<String>) -> ActionError {
    ControlSignal::Redirect(path.into()).into()
}

/// Run a unit of work, normalizing its failures.
///
/// Success values come back unchanged. A control signal is returned as the
/// outer error without being normalized. Any other failure is logged and
/// resolved to its [`HandledError`].
pub async fn catch_action<T, Fut>(work: Fut) -> ActionResult<T>
where
    Fut: Future<Output = Result<T, ActionError>>,
{
    match work.await {
        Ok(value) => Ok(Ok(value)),
        Err(ActionError::Signal(signal)) => Err(signal),
        Err(ActionError::Failed(failure)) => Ok(Err(handle_failure(&failure))),
    }
}

/// Wrap an action so every call goes through [`catch_action`].
///
/// Actions taking several arguments take them as a tuple.
pub fn catch_async_action<A, T, F, Fut>(
    action: F,
) -> impl Fn(A) -> BoxFuture<'static, ActionResult<T>> + Clone
where
    F: Fn(A) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
    T: Send + 'static,
{
    move |args| catch_action(action(args)).boxed()
}

/// Normalize and log a failure
pub fn handle_failure(failure: &Failure) -> HandledError {
    let Normalized {
        handled_error,
        is_unknown_error,
    } = error_handler(failure);

    if is_unknown_error {
        tracing::error!(error = ?failure, "Unknown error has occurred!");
    } else {
        tracing::warn!(
            status = handled_error.status_code,
            data = ?handled_error.data,
            "{}",
            handled_error.message
        );
    }

    handled_error
}
