//! Validation Traits
//!
//! Common validation patterns shared by route handlers.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty strings.
///
/// # Example
/// ```ignore
/// use tabula_api::validation::ValidateNonEmpty;
///
/// fn save(description: &str) -> ApiResult<()> {
///     description.validate_non_empty("description")?;
///     // ... rest of logic
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Returns `ApiError::missing_field` if the value is empty or whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64, usize);

// ============================================================================
// PAGINATION
// ============================================================================

/// A validated `limit`/`offset` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Parse raw query values strictly.
    ///
    /// Only plain decimal digits are accepted: signs, whitespace, decimals
    /// and empty strings are rejected. `limit` may not exceed
    /// [`MAX_PAGE_SIZE`].
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> ApiResult<Self> {
        let defaults = Self::default();
        let limit = match limit {
            Some(raw) => parse_non_negative("limit", raw)?,
            None => defaults.limit,
        };
        if limit > MAX_PAGE_SIZE {
            return Err(ApiError::invalid_pagination(
                "limit",
                &limit.to_string(),
                &format!("must be at most {}", MAX_PAGE_SIZE),
            ));
        }
        let offset = match offset {
            Some(raw) => parse_non_negative("offset", raw)?,
            None => defaults.offset,
        };
        Ok(Self { limit, offset })
    }
}

fn parse_non_negative(field: &str, raw: &str) -> ApiResult<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::invalid_pagination(
            field,
            raw,
            "must be a non-negative integer",
        ));
    }
    raw.parse::<i64>()
        .map_err(|_| ApiError::invalid_pagination(field, raw, "is out of range"))
}

/// Parse a row id path segment.
pub fn parse_row_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| {
        ApiError::invalid_input(format!("Invalid row id '{}': expected an integer", raw))
            .with_details(serde_json::json!({ "field": "id" }))
    })
}
