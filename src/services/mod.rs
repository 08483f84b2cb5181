//! Business logic services

pub mod action;
pub mod auth_service;
pub mod user_service;

pub use action::{catch_action, catch_async_action, handle_failure, ActionResult, ControlSignal};
pub use auth_service::AuthService;
pub use user_service::UserService;
