//! User handler implementations
//!
//! Handlers only adapt HTTP to the user actions: path, query and body are
//! handed over untyped, and the action's outcome is rendered as JSON, a
//! normalized error, or a `303 See Other`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::{
    error::Failure,
    middleware::OptionalAuth,
    services::{handle_failure, ActionResult},
    state::AppState,
};

/// List users (paginated, optionally filtered by email)
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Map<String, Value>>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => Value::Object(query),
        Err(rejection) => return rejected(rejection),
    };

    render(state.users().get_users(query).await.map(|r| r.map(Json)))
}

/// Get a specific user by ID
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    render(
        state
            .users()
            .get_user_by_id(Value::String(id))
            .await
            .map(|r| r.map(Json)),
    )
}

/// Create a user
pub async fn create_user(
    State(state): State<AppState>,
    auth: OptionalAuth,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected(rejection),
    };

    render(state.users().create_user(auth.role(), payload).await)
}

/// Replace a user's fields
pub async fn update_user(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected(rejection),
    };

    render(
        state
            .users()
            .update_user_by_id(auth.role(), Value::String(id), payload)
            .await,
    )
}

/// Delete a user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
) -> Response {
    render(
        state
            .users()
            .delete_user_by_id(auth.role(), Value::String(id))
            .await,
    )
}

fn render<T: IntoResponse>(result: ActionResult<T>) -> Response {
    match result {
        Ok(Ok(value)) => value.into_response(),
        Ok(Err(handled)) => handled.into_response(),
        Err(signal) => signal.into_response(),
    }
}

/// Extractor rejections go through the same normalization as action failures
fn rejected(rejection: impl Into<Failure>) -> Response {
    handle_failure(&rejection.into()).into_response()
}
