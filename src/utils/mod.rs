//! Utility functions

pub mod text;
pub mod time;

pub use text::{capitalize_first_letters, generate_array};
pub use time::{how_long_ago, pause};
