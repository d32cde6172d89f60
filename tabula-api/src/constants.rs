//! Constants for Tabula API
//!
//! Centralizing constants makes them easy to find, modify, and test.

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// PAGINATION
// ============================================================================

/// Default page size for row listings
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Maximum page size for row listings
pub const MAX_PAGE_SIZE: i64 = 1000;

// ============================================================================
// BATCH OPERATIONS
// ============================================================================

/// Maximum number of rows allowed in a single bulk insert
pub const MAX_BATCH_ROWS: usize = 1000;

/// PostgreSQL accepts at most this many bind parameters per statement
pub const MAX_BIND_PARAMETERS: usize = 65535;

// ============================================================================
// RETRIEVAL
// ============================================================================

/// Default number of contexts returned by a similarity search
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Default number of contexts used to ground a generated query
pub const DEFAULT_ASK_LIMIT: usize = 3;

/// Upper bound on `limit` for search and ask requests
pub const MAX_SEARCH_LIMIT: usize = 100;
