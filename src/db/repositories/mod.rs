//! Database repositories
//!
//! Repositories handle all direct interactions with the user store.

pub mod memory_repo;
pub mod user_repo;

use async_trait::async_trait;

use crate::{
    error::Failure,
    models::{NewUser, User},
};

pub use memory_repo::MemoryUserRepository;
pub use user_repo::UserRepository;

/// Result of a store operation
pub type StoreResult<T> = Result<T, Failure>;

/// Persistence operations on users.
///
/// Writes that would duplicate an email fail with a 400 `AppError` carrying
/// `{email: ...}` metadata; every other store problem is `Failure::Unexpected`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Zero or one user
    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Insert and return the persisted row
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Update and return the persisted row, `None` if no row has `id`
    async fn update_user_by_id(&self, id: i64, user: NewUser) -> StoreResult<Option<User>>;

    /// One page of users whose email contains `email` (case-insensitive)
    async fn get_users(&self, limit: u32, offset: u64, email: &str) -> StoreResult<Vec<User>>;

    /// Count of users whose email contains `email`, before paging
    async fn get_number_of_rows(&self, email: &str) -> StoreResult<u64>;

    /// Delete, returning the number of rows removed
    async fn delete_user_by_id(&self, id: i64) -> StoreResult<u64>;
}
