//! In-memory user repository
//!
//! Same contract as the Postgres repository, without a database. Used when
//! running tests and local demos.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{user_repo::duplicate_email, StoreResult, UserStore};
use crate::models::{NewUser, User};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    // Kept to mirror the table; nothing reads it back.
    #[allow(dead_code)]
    password_hash: String,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, StoredUser>,
    last_id: i64,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|row| row.user.email == email && Some(row.user.id) != except)
    }

    fn matching<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a StoredUser> + 'a {
        let needle = email.to_lowercase();
        self.rows
            .values()
            .filter(move |row| needle.is_empty() || row.user.email.to_lowercase().contains(&needle))
    }
}

/// User repository kept in process memory
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    table: RwLock<Table>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|row| row.user.clone()))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.table.write().await;
        if table.email_taken(&user.email, None) {
            return Err(duplicate_email().into());
        }

        table.last_id += 1;
        let now = Self::now();
        let created = User {
            id: table.last_id,
            email: user.email,
            role: user.role,
            created_at: now,
            updated_at: now,
        };

        table.rows.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );

        Ok(created)
    }

    async fn update_user_by_id(&self, id: i64, user: NewUser) -> StoreResult<Option<User>> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if table.email_taken(&user.email, Some(id)) {
            return Err(duplicate_email().into());
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.user.email = user.email;
        row.user.role = user.role;
        row.user.updated_at = Self::now();
        row.password_hash = user.password_hash;

        Ok(Some(row.user.clone()))
    }

    async fn get_users(&self, limit: u32, offset: u64, email: &str) -> StoreResult<Vec<User>> {
        let table = self.table.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);

        Ok(table
            .matching(email)
            .skip(offset)
            .take(limit as usize)
            .map(|row| row.user.clone())
            .collect())
    }

    async fn get_number_of_rows(&self, email: &str) -> StoreResult<u64> {
        let table = self.table.read().await;
        Ok(table.matching(email).count() as u64)
    }

    async fn delete_user_by_id(&self, id: i64) -> StoreResult<u64> {
        let mut table = self.table.write().await;
        Ok(u64::from(table.rows.remove(&id).is_some()))
    }
}
