//! Session middleware
//!
//! Reads an optional `Authorization: Bearer <jwt>` header. A valid token
//! attaches an [`AuthenticatedUser`] to the request; a missing or invalid
//! one leaves the request anonymous, and the actions decide what an
//! anonymous caller may do.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{models::Role, services::AuthService, state::AppState};

/// Authenticated user extracted from JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Optional authenticated user wrapper (never fails)
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl OptionalAuth {
    /// Role of the caller, if signed in
    pub fn role(&self) -> Option<Role> {
        self.0.as_ref().map(|user| user.role)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}

/// Attach the session user, if any
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        match authenticate(&token, &state.config().auth.secret) {
            Some(user) => {
                debug!(user_id = user.id, role = %user.role, "Session user attached");
                request.extensions_mut().insert(user);
            }
            None => debug!(path = %request.uri().path(), "Ignoring invalid session token"),
        }
    }

    next.run(request).await
}

fn authenticate(token: &str, secret: &str) -> Option<AuthenticatedUser> {
    let claims = AuthService::verify_token(token, secret).ok()?;
    let id = claims.sub.parse().ok()?;

    Some(AuthenticatedUser {
        id,
        email: claims.email,
        role: claims.role,
    })
}
