//! Path and pagination parameters
//!
//! Numbers are coerced from strings, since ids and page numbers usually
//! arrive through paths and query strings. Invalid page numbers and page
//! sizes fall back to their defaults instead of failing.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Resource id parameter: a positive integer
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct IdParams {
    #[serde(deserialize_with = "coerce_integer")]
    #[validate(range(min = 1, message = "Number must be greater than 0"))]
    pub id: i64,
}

/// User listing query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UsersQuery {
    /// 1-based page number
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: u32,

    /// Page size
    #[serde(default = "default_amount", deserialize_with = "lenient_amount")]
    pub amount: u32,

    /// Case-insensitive substring filter; empty matches everything
    #[serde(default, deserialize_with = "string_or_empty")]
    pub email: String,
}

impl Default for UsersQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            amount: DEFAULT_PAGE_SIZE,
            email: String::new(),
        }
    }
}

impl UsersQuery {
    /// Row offset of the first item on the page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.amount)
    }
}

/// Number of pages needed to show `count` rows, `amount` per page
pub fn page_count(count: u64, amount: u32) -> u64 {
    if amount == 0 {
        return 0;
    }
    count.div_ceil(u64::from(amount))
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_amount() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn lenient_page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(positive_or(&value, DEFAULT_PAGE))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(positive_or(&value, DEFAULT_PAGE_SIZE))
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Positive integer held by `value`, or `default`
fn positive_or(value: &Value, default: u32) -> u32 {
    as_integer(value)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Integer held by a JSON number or a numeric string.
///
/// Floats only count when they have no fractional part.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| as_integer(&Value::from(trimmed.parse::<f64>().ok()?)))
        }
        _ => None,
    }
}

fn coerce_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    as_integer(&value)
        .ok_or_else(|| de::Error::custom(format!("Expected integer, received {value}")))
}
