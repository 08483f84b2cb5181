//! Request validation
//!
//! Untyped input (`serde_json::Value`) is parsed into a declared shape: a
//! type that derives `Deserialize` and `validator::Validate`. Failures are
//! reported as a flat map from dot-joined field paths to reasons.
//!
//! Two call conventions are offered: [`validate`] returns the failure as an
//! ordinary value, [`validate_unsafe`] turns it into a 400 [`AppError`].

pub mod pagination;
pub mod users;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use serde_path_to_error::Segment;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::{
    constants::messages,
    error::{AppError, AppResult, Failure, Metadata},
};

pub use pagination::{IdParams, UsersQuery};
pub use users::{PasswordPolicy, UserRequest};

/// Path of errors that belong to the input as a whole, such as a
/// non-object body or a missing field
pub const ROOT_PATH: &str = "";

/// Structured validation failure: `{message: "Invalid data", data: {path: reason}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub message: String,
    pub data: Metadata,
}

impl ValidationFailure {
    pub fn new(data: Metadata) -> Self {
        Self {
            message: messages::INVALID_DATA.to_string(),
            data,
        }
    }

    /// Failure with a single field reason
    pub fn field(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut data = Metadata::new();
        data.insert(path.into(), reason.into());
        Self::new(data)
    }
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut data = Metadata::new();
        flatten_errors(None, &errors, &mut data);
        Self::new(data)
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ValidationFailure {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err
            .path()
            .iter()
            .filter_map(|segment| match segment {
                Segment::Seq { index } => Some(index.to_string()),
                Segment::Map { key } => Some(key.clone()),
                Segment::Enum { variant } => Some(variant.clone()),
                Segment::Unknown => None,
            })
            .collect::<Vec<_>>()
            .join(".");

        Self::field(path, err.into_inner().to_string())
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        AppError::bad_request(failure.message).with_metadata(failure.data)
    }
}

impl From<ValidationFailure> for Failure {
    fn from(failure: ValidationFailure) -> Self {
        Failure::App(failure.into())
    }
}

/// Parse and validate `input` as `T`, returning the failure as a value.
pub fn validate<T>(input: &Value) -> Result<T, ValidationFailure>
where
    T: DeserializeOwned + Validate,
{
    validate_with(input, |_, _| {})
}

/// Like [`validate`], with an extra check that may add field reasons.
///
/// `extra` runs even when the derived rules already failed, so every
/// problem with the input is reported at once. Reasons the derived rules
/// produced for a path are kept over the ones `extra` adds.
pub fn validate_with<T, F>(input: &Value, extra: F) -> Result<T, ValidationFailure>
where
    T: DeserializeOwned + Validate,
    F: FnOnce(&T, &mut Metadata),
{
    let value: T = serde_path_to_error::deserialize(input)?;

    let mut data = Metadata::new();
    if let Err(errors) = value.validate() {
        flatten_errors(None, &errors, &mut data);
    }

    let mut extra_data = Metadata::new();
    extra(&value, &mut extra_data);
    for (path, reason) in extra_data {
        data.entry(path).or_insert(reason);
    }

    if data.is_empty() {
        Ok(value)
    } else {
        Err(ValidationFailure::new(data))
    }
}

/// Parse and validate `input` as `T`, raising a 400 on failure.
pub fn validate_unsafe<T>(input: &Value) -> AppResult<T>
where
    T: DeserializeOwned + Validate,
{
    validate(input).map_err(AppError::from)
}

fn flatten_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Metadata) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(last) = list.last() {
                    out.entry(path).or_insert_with(|| reason(last));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_errors(Some(&format!("{path}.{index}")), inner, out);
                }
            }
        }
    }
}

fn reason(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("Invalid value ({})", error.code))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Address {
        #[validate(length(min = 1, message = "Street is required"))]
        street: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Person {
        #[validate(length(min = 2, message = "Name is too short"))]
        name: String,
        #[validate(range(min = 0, max = 150))]
        age: i32,
        #[validate(nested)]
        address: Address,
    }

    #[test]
    fn test_validate_returns_parsed_value() {
        let person: Person = validate(&json!({
            "name": "John",
            "age": 30,
            "address": { "street": "Main" }
        }))
        .unwrap();

        assert_eq!(person.name, "John");
        assert_eq!(person.age, 30);
    }

    #[test]
    fn test_validate_collects_field_reasons() {
        let failure = validate::<Person>(&json!({
            "name": "J",
            "age": 200,
            "address": { "street": "" }
        }))
        .unwrap_err();

        assert_eq!(failure.message, "Invalid data");
        assert_eq!(failure.data["name"], "Name is too short");
        assert!(failure.data.contains_key("age"));
        assert_eq!(failure.data["address.street"], "Street is required");
    }

    #[test]
    fn test_type_errors_are_reported_on_their_field() {
        let failure = validate::<Person>(&json!({
            "name": 5,
            "age": 30,
            "address": { "street": "Main" }
        }))
        .unwrap_err();

        assert_eq!(failure.message, "Invalid data");
        assert_eq!(
            failure.data["name"],
            "invalid type: integer `5`, expected a string"
        );
    }

    #[test]
    fn test_nested_type_errors_use_dot_paths() {
        let failure = validate::<Person>(&json!({
            "name": "John",
            "age": 30,
            "address": { "street": false }
        }))
        .unwrap_err();

        assert!(failure.data.contains_key("address.street"));
    }

    #[test]
    fn test_whole_input_errors_are_reported_at_root() {
        let failure = validate::<Person>(&json!(5)).unwrap_err();
        assert!(failure.data.contains_key(ROOT_PATH));

        let failure = validate::<Person>(&json!({ "name": "John" })).unwrap_err();
        assert_eq!(failure.data[ROOT_PATH], "missing field `age`");
    }

    #[test]
    fn test_extra_checks_do_not_override_derived_reasons() {
        let failure = validate_with::<Person, _>(
            &json!({ "name": "J", "age": 1, "address": { "street": "x" } }),
            |_, data| {
                data.insert("name".to_string(), "extra".to_string());
                data.insert("age".to_string(), "too young".to_string());
            },
        )
        .unwrap_err();

        assert_eq!(failure.data["name"], "Name is too short");
        assert_eq!(failure.data["age"], "too young");
    }

    #[test]
    fn test_validate_unsafe_raises_bad_request() {
        let err = validate_unsafe::<Person>(&json!({
            "name": "J",
            "age": 1,
            "address": { "street": "x" }
        }))
        .unwrap_err();

        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(err.message(), "Invalid data");
        assert_eq!(err.metadata()["name"], "Name is too short");
    }
}
