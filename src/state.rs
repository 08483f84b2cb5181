//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{config::Config, services::UserService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// User actions, wired to the store and path cache
    users: UserService,

    /// Application configuration
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(users: UserService, config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner { users, config }),
        }
    }

    pub fn users(&self) -> &UserService {
        &self.inner.users
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
