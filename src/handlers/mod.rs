//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod health;
pub mod users;

use axum::Router;

use crate::{constants::USERS_PATH, state::AppState};

/// Create all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .nest(USERS_PATH, users::routes())
}
