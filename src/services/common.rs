//! Helpers shared by the resource services

use super::error::{ServiceError, ServiceResult};
use crate::db::{Filter, Query};

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: usize = 50;

/// Largest page size a caller may ask for
pub const MAX_LIMIT: usize = 200;

/// A page request: how many documents, and after which one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub start_after: Option<String>,
}

impl Page {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            start_after: None,
        }
    }

    pub fn after(mut self, id: Option<String>) -> Self {
        self.start_after = id;
        self
    }

    /// Apply limit and cursor to a query
    pub fn apply(&self, query: Query) -> Query {
        query
            .start_after(self.start_after.clone())
            .limit(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

/// Clamp a raw `limit` parameter.
///
/// Missing, non-numeric and non-positive values give `default`; anything
/// larger than [`MAX_LIMIT`] is capped.
pub fn clamp_limit(raw: Option<&str>, default: usize) -> usize {
    let parsed = raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.floor() as usize)
        .unwrap_or(default);
    parsed.min(MAX_LIMIT)
}

/// A non-empty value or `"<field> is required"`
pub fn required(value: Option<String>, field: &str) -> ServiceResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{} is required", field))),
    }
}

/// Like [`required`] but returns the trimmed value
pub fn required_trimmed(value: Option<String>, field: &str) -> ServiceResult<String> {
    required(value, field).map(|v| v.trim().to_string())
}

/// Trimmed text, empty when absent
pub fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// A non-blank value, or `None`
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An equality filter for an optional, non-blank string parameter
pub fn eq_filter(field: &'static str, value: Option<String>) -> Option<Filter> {
    present(value).map(|v| Filter::eq(field, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_limit_defaults() {
        assert_eq!(clamp_limit(None, 50), 50);
        assert_eq!(clamp_limit(Some("abc"), 50), 50);
        assert_eq!(clamp_limit(Some("0"), 50), 50);
        assert_eq!(clamp_limit(Some("-3"), 20), 20);
        assert_eq!(clamp_limit(Some("10"), 50), 10);
        assert_eq!(clamp_limit(Some("999"), 50), 200);
        assert_eq!(clamp_limit(Some("7.9"), 50), 7);
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some("x".into()), "title").unwrap(), "x");
        let err = required(Some("   ".into()), "title").unwrap_err();
        assert_eq!(err.to_string(), "title is required");
        assert!(required(None, "title").is_err());
        assert_eq!(required_trimmed(Some(" a ".into()), "name").unwrap(), "a");
    }

    #[test]
    fn test_page_apply() {
        let query = Page::new(5).after(Some("abc".into())).apply(Query::new());
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.start_after.as_deref(), Some("abc"));
    }

    proptest! {
        #[test]
        fn prop_clamp_limit_in_bounds(raw in any::<i64>(), default in 1usize..=200) {
            let limit = clamp_limit(Some(&raw.to_string()), default);
            prop_assert!(limit >= 1 && limit <= MAX_LIMIT);
            if raw >= 1 && raw <= 200 {
                prop_assert_eq!(limit, raw as usize);
            }
        }
    }
}
