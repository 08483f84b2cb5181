//! Authentication service
//!
//! Sessions are bearer JWTs signed with `AUTH_SECRET`. The token's role is
//! the only thing the user actions look at.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::Failure, models::Role};

/// Lifetime of issued tokens
const TOKEN_LIFETIME_HOURS: i64 = 12;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Verify JWT token and extract claims
    pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Failure> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Sign a session token for the given user
    pub fn issue_token(id: i64, email: &str, role: Role, secret: &str) -> Result<String, Failure> {
        let now = Utc::now();
        let claims = Claims {
            sub: id.to_string(),
            email: email.to_string(),
            role,
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Hash password using Argon2
    pub fn hash_password(password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
            .to_string();

        Ok(hash)
    }
}
