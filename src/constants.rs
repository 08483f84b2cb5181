//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default log filter when neither `RUST_LOG` nor the config provide one
pub const DEFAULT_LOG_FILTER: &str = "info";

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

/// Postgres SQLSTATE for unique constraint violations
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

// =============================================================================
// USER ROLES
// =============================================================================

/// User role identifiers, as stored and serialized
pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const BASIC: &str = "Basic";
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: u64 = 30;

/// Characters accepted as "special" by the strict password policy
pub const PASSWORD_SPECIAL_CHARACTERS_REGEX: &str = r#"[!@#$%^&*(),.?":{}|<>]"#;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page (pages are 1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// PATHS
// =============================================================================

/// Listing path; revalidated after every mutation
pub const USERS_PATH: &str = "/users";

// =============================================================================
// PATH CACHE
// =============================================================================

/// Most entries the in-process cache holds before evicting
pub const CACHE_MAX_ENTRIES: u64 = 1_000;

/// Lifetime of a cached entry, in seconds
pub const CACHE_TTL_SECS: u64 = 300;

// =============================================================================
// MESSAGES
// =============================================================================

/// User-facing messages shared across layers
pub mod messages {
    /// Message attached to every validation failure
    pub const INVALID_DATA: &str = "Invalid data";

    /// Message used when an unknown failure is normalized
    pub const UNKNOWN_ERROR: &str = "Something went wrong in the server.";

    pub const RESOURCE_NOT_FOUND: &str = "Resource not found";
    pub const DUPLICATE_KEY: &str = "Duplicate key";
    pub const DUPLICATE_EMAIL: &str = "Can not have an already existing email";
    pub const NOT_AUTHORIZED: &str = "It seems you are not authorized to perform this action.";
}
