//! User model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::roles;

/// User role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    Admin,
    #[default]
    Basic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => roles::ADMIN,
            Role::Basic => roles::BASIC,
        }
    }

    /// Check if the role may mutate users
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User as returned to callers; the password never leaves the store
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User fields written by create and update
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_basic() {
        assert_eq!(Role::default(), Role::Basic);
        assert!(!Role::Basic.is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn test_role_serializes_as_name() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), "Admin");
        assert_eq!(Role::Basic.to_string(), "Basic");
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let now = Utc::now();
        let user = User {
            id: 1,
            email: "email@email.com".to_string(),
            role: Role::Basic,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("password").is_none());
    }
}
