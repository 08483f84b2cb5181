//! Domain models
//!
//! This module contains the domain models and response envelopes.

pub mod pagination;
pub mod user;

pub use pagination::*;
pub use user::*;
