//! User request shape and password policy

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crate::{
    constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PASSWORD_SPECIAL_CHARACTERS_REGEX},
    error::Metadata,
    models::Role,
};

use super::{validate_with, ValidationFailure};

static SPECIAL_CHARACTERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(PASSWORD_SPECIAL_CHARACTERS_REGEX).expect("special characters pattern is valid")
});

/// Create/update user request
#[derive(Clone, Deserialize, Validate)]
pub struct UserRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,

    /// Plain-text password; checked by the configured [`PasswordPolicy`]
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub role: Role,
}

impl fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl UserRequest {
    /// Validate untyped input as a user request under `policy`
    pub fn parse(input: &Value, policy: PasswordPolicy) -> Result<Self, ValidationFailure> {
        validate_with(input, |request: &Self, data: &mut Metadata| {
            if let Err(reason) = policy.check(&request.password) {
                data.insert("password".to_string(), reason.to_string());
            }
        })
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Password strength rules.
///
/// Two policies exist because both were in use historically; which one is
/// intended has not been settled, so the choice is left to configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordPolicy {
    /// Length plus an uppercase letter, a digit and a special character
    #[default]
    Strict,
    /// Length only
    Length,
}

impl PasswordPolicy {
    /// Check `password` against every rule of the policy.
    ///
    /// When several rules are broken, the reason of the last one in rule
    /// order is returned: length, uppercase, digit, special character,
    /// maximum length.
    pub fn check(self, password: &str) -> Result<(), &'static str> {
        let length = password.chars().count() as u64;
        let strict = self == Self::Strict;

        let rules = [
            (
                length >= MIN_PASSWORD_LENGTH,
                "Password must be at least 8 characters long",
            ),
            (
                !strict || password.chars().any(|c| c.is_ascii_uppercase()),
                "Password must have at least one uppercase letter",
            ),
            (
                !strict || password.chars().any(|c| c.is_ascii_digit()),
                "Password must have at least one numeric character",
            ),
            (
                !strict || SPECIAL_CHARACTERS.is_match(password),
                "Password must have at least one special character",
            ),
            (
                length <= MAX_PASSWORD_LENGTH,
                "Password must be at most 30 characters.",
            ),
        ];

        match rules.iter().rev().find(|(passed, _)| !passed) {
            Some((_, reason)) => Err(*reason),
            None => Ok(()),
        }
    }
}

impl FromStr for PasswordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "length" => Ok(Self::Length),
            other => Err(format!("unknown password policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_well_formed_request_parses() {
        let request = UserRequest::parse(
            &json!({ "email": "  ann@example.com ", "password": "Secret#123" }),
            PasswordPolicy::Strict,
        )
        .unwrap();

        assert_eq!(request.email, "ann@example.com");
        assert_eq!(request.role, Role::Basic);
    }

    #[test]
    fn test_explicit_role() {
        let request = UserRequest::parse(
            &json!({ "email": "root@example.com", "password": "Secret#123", "role": "Admin" }),
            PasswordPolicy::Strict,
        )
        .unwrap();

        assert_eq!(request.role, Role::Admin);
    }

    #[test]
    fn test_invalid_email_is_reported_on_its_field() {
        let failure = UserRequest::parse(
            &json!({ "email": "not-an-email", "password": "Secret#123" }),
            PasswordPolicy::Strict,
        )
        .unwrap_err();

        assert_eq!(failure.message, "Invalid data");
        assert_eq!(failure.data["email"], "Please enter a valid email.");
        assert!(!failure.data.contains_key("password"));
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let failure = UserRequest::parse(&json!({}), PasswordPolicy::Strict).unwrap_err();

        assert_eq!(failure.data["email"], "Please enter a valid email.");
        assert_eq!(
            failure.data["password"],
            "Password must have at least one special character"
        );

        let failure = UserRequest::parse(&json!({}), PasswordPolicy::Length).unwrap_err();
        assert_eq!(
            failure.data["password"],
            "Password must be at least 8 characters long"
        );
    }

    #[test]
    fn test_unknown_role_is_reported_on_its_field() {
        let failure = UserRequest::parse(
            &json!({ "email": "ann@example.com", "password": "Secret#123", "role": "Root" }),
            PasswordPolicy::Strict,
        )
        .unwrap_err();

        assert_eq!(failure.data.len(), 1);
        assert!(failure.data["role"].contains("unknown variant `Root`"));
    }

    #[test]
    fn test_wrong_email_type_is_reported_on_its_field() {
        let failure = UserRequest::parse(
            &json!({ "email": 5, "password": "Secret#123" }),
            PasswordPolicy::Strict,
        )
        .unwrap_err();

        assert_eq!(
            failure.data["email"],
            "invalid type: integer `5`, expected a string"
        );
    }

    #[test]
    fn test_strict_policy() {
        let policy = PasswordPolicy::Strict;
        assert!(policy.check("Secret#123").is_ok());
        assert_eq!(
            policy.check("Sh0rt!"),
            Err("Password must be at least 8 characters long")
        );
        assert_eq!(
            policy.check("short"),
            Err("Password must have at least one special character")
        );
        assert_eq!(
            policy.check("short1!"),
            Err("Password must have at least one uppercase letter")
        );
        assert_eq!(
            policy.check("secret#123"),
            Err("Password must have at least one uppercase letter")
        );
        assert_eq!(
            policy.check("Secret#abc"),
            Err("Password must have at least one numeric character")
        );
        assert_eq!(
            policy.check("Secret1234"),
            Err("Password must have at least one special character")
        );
        assert_eq!(
            policy.check("Secret#1234567890123456789012345"),
            Err("Password must be at most 30 characters.")
        );
    }

    #[test]
    fn test_length_policy() {
        let policy = PasswordPolicy::Length;
        assert!(policy.check("plainpassword").is_ok());
        assert!(policy.check("short").is_err());
        assert!(policy.check(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<PasswordPolicy>(), Ok(PasswordPolicy::Strict));
        assert_eq!("LENGTH".parse::<PasswordPolicy>(), Ok(PasswordPolicy::Length));
        assert!("none".parse::<PasswordPolicy>().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let request = UserRequest::parse(
            &json!({ "email": "ann@example.com", "password": "Secret#123" }),
            PasswordPolicy::Strict,
        )
        .unwrap();

        assert!(!format!("{request:?}").contains("Secret#123"));
    }
}
