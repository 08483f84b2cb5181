//! User repository

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreResult, UserStore};
use crate::{
    constants::{messages, UNIQUE_VIOLATION_CODE},
    error::{AppError, Failure, Metadata},
    models::{NewUser, User},
};

/// Columns safe to hand back to callers
const USER_COLUMNS: &str = "id, email, role, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user)
    }

    async fn update_user_by_id(&self, id: i64, user: NewUser) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET
                email = $2,
                password_hash = $3,
                role = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user)
    }

    async fn get_users(&self, limit: u32, offset: u64, email: &str) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1 = '' OR email ILIKE '%' || $1 || '%')
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(email)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_number_of_rows(&self, email: &str) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1 = '' OR email ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn delete_user_by_id(&self, id: i64) -> StoreResult<u64> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Unique violations on writes are the caller's fault; everything else is not
fn map_write_error(err: sqlx::Error) -> Failure {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return duplicate_email().into();
        }
    }

    err.into()
}

/// The error raised when a write would duplicate an email
pub fn duplicate_email() -> AppError {
    let mut metadata = Metadata::new();
    metadata.insert("email".to_string(), messages::DUPLICATE_EMAIL.to_string());

    AppError::bad_request(messages::DUPLICATE_KEY).with_metadata(metadata)
}
