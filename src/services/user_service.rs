//! User actions
//!
//! Each public method is one use case: validate the input, check the
//! caller's role for mutations, talk to the store, then either return the
//! payload or signal a redirect. Everything runs inside [`catch_action`], so
//! callers get an [`ActionResult`] and never a raw failure.

use std::{convert::Infallible, sync::Arc};

use serde_json::{json, Value};

use super::{
    action::{catch_action, redirect, ActionError, ActionResult},
    AuthService,
};
use crate::{
    cache::PathCache,
    constants::{messages, USERS_PATH},
    db::repositories::UserStore,
    error::{AppError, Failure},
    models::{NewUser, PaginationResponse, Role, User},
    validation::{validate, IdParams, PasswordPolicy, UserRequest, UsersQuery},
};

/// User management actions
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn PathCache>,
    password_policy: PasswordPolicy,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn PathCache>,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            store,
            cache,
            password_policy,
        }
    }

    /// Fetch one user; 404 when no row has the id
    pub async fn get_user_by_id(&self, id: Value) -> ActionResult<User> {
        catch_action(async {
            let IdParams { id } = parse_id(id)?;
            let user = self.store.get_user_by_id(id).await?.ok_or_else(not_found)?;
            Ok(user)
        })
        .await
    }

    /// One page of users plus totals.
    ///
    /// Invalid `page` or `amount` values fall back to their defaults.
    /// Identical queries are answered from the `/users` cache until a
    /// mutation revalidates it.
    pub async fn get_users(&self, query: Value) -> ActionResult<PaginationResponse<User>> {
        catch_action(async {
            let query: UsersQuery = validate(&query)?;
            let key = cache_key(&query);

            // Read before the store so a mutation landing mid-query
            // invalidates what we are about to cache
            let generation = self.cache_generation().await;
            if generation.is_some() {
                if let Some(cached) = self.cached_page(&key).await {
                    return Ok(cached);
                }
            }

            let (count, users) = tokio::try_join!(
                self.store.get_number_of_rows(&query.email),
                self.store
                    .get_users(query.amount, query.offset(), &query.email),
            )?;

            let page = PaginationResponse::new(users, count, query.amount);
            if let Some(generation) = generation {
                self.store_page(&key, &page, generation).await;
            }

            Ok(page)
        })
        .await
    }

    /// Create a user and redirect to it
    pub async fn create_user(&self, role: Option<Role>, input: Value) -> ActionResult<Infallible> {
        catch_action(async {
            let request = UserRequest::parse(&input, self.password_policy)?;
            authorize(role)?;

            let user = self.store.create_user(new_user(request)?).await?;
            tracing::info!(user_id = user.id, "User created");

            self.revalidate_users().await;
            Err(redirect(user_path(user.id)))
        })
        .await
    }

    /// Replace a user's fields and redirect to it; 404 when no row has the id
    pub async fn update_user_by_id(
        &self,
        role: Option<Role>,
        id: Value,
        input: Value,
    ) -> ActionResult<Infallible> {
        catch_action(async {
            let IdParams { id } = parse_id(id)?;
            let request = UserRequest::parse(&input, self.password_policy)?;
            authorize(role)?;

            let user = self
                .store
                .update_user_by_id(id, new_user(request)?)
                .await?
                .ok_or_else(not_found)?;
            tracing::info!(user_id = user.id, "User updated");

            self.revalidate_users().await;
            Err(redirect(user_path(user.id)))
        })
        .await
    }

    /// Delete a user and redirect to the listing; 404 when nothing was deleted
    pub async fn delete_user_by_id(&self, role: Option<Role>, id: Value) -> ActionResult<Infallible> {
        catch_action(async {
            let IdParams { id } = parse_id(id)?;
            authorize(role)?;

            if self.store.delete_user_by_id(id).await? == 0 {
                return Err(ActionError::from(not_found()));
            }
            tracing::info!(user_id = id, "User deleted");

            self.revalidate_users().await;
            Err(redirect(USERS_PATH))
        })
        .await
    }

    /// `None` when the cache is unreachable; the listing then skips it
    async fn cache_generation(&self) -> Option<u64> {
        match self.cache.generation(USERS_PATH).await {
            Ok(generation) => Some(generation),
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to read users cache generation");
                None
            }
        }
    }

    /// Cached page for `key`; cache trouble only costs a store round trip
    async fn cached_page(&self, key: &str) -> Option<PaginationResponse<User>> {
        let cached = match self.cache.get(USERS_PATH, key).await {
            Ok(cached) => cached?,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to read users cache");
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable users cache entry");
                None
            }
        }
    }

    async fn store_page(&self, key: &str, page: &PaginationResponse<User>, generation: u64) {
        let result = match serde_json::to_string(page) {
            Ok(body) => self.cache.put(USERS_PATH, key, body, generation).await,
            Err(e) => Err(Failure::from(e)),
        };

        match result {
            Ok(true) => {}
            Ok(false) => tracing::debug!(key, "Users changed while listing; page not cached"),
            Err(e) => tracing::warn!(error = ?e, "Failed to cache users page"),
        }
    }

    /// The write already happened; a stale listing is not worth failing it
    async fn revalidate_users(&self) {
        if let Err(e) = self.cache.revalidate(USERS_PATH).await {
            tracing::error!(error = ?e, "Failed to revalidate users cache");
        }
    }
}

fn parse_id(id: Value) -> Result<IdParams, ActionError> {
    Ok(validate(&json!({ "id": id }))?)
}

/// Only admins may change users
fn authorize(role: Option<Role>) -> Result<(), AppError> {
    match role {
        Some(role) if role.is_admin() => Ok(()),
        _ => Err(AppError::forbidden(messages::NOT_AUTHORIZED)),
    }
}

fn new_user(request: UserRequest) -> Result<NewUser, ActionError> {
    let password_hash = AuthService::hash_password(&request.password)?;

    Ok(NewUser {
        email: request.email,
        password_hash,
        role: request.role,
    })
}

fn not_found() -> AppError {
    AppError::not_found(messages::RESOURCE_NOT_FOUND)
}

fn user_path(id: i64) -> String {
    format!("{USERS_PATH}/{id}")
}

fn cache_key(query: &UsersQuery) -> String {
    format!(
        "page={}&amount={}&email={}",
        query.page, query.amount, query.email
    )
}
