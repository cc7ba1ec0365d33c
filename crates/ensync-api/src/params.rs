//! Shared paging and sorting parameters for list operations.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size the API accepts.
pub const MAX_LIMIT: u32 = 100;
/// Default sort field.
pub const DEFAULT_ORDER_BY: &str = "createdAt";

/// Sort fields accepted when listing events.
pub const EVENT_ORDER_FIELDS: &[&str] = &["name", "createdAt"];
/// Sort fields accepted when listing access keys.
pub const ACCESS_KEY_ORDER_FIELDS: &[&str] = &["name", "createdAt"];
/// Sort fields accepted when listing workspaces.
pub const WORKSPACE_ORDER_FIELDS: &[&str] = &["name", "createdAt"];

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortOrder {
    /// Query string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(ValidationError::InvalidOrder {
                value: trimmed.to_string(),
            })
        }
    }
}

/// List parameters rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Page size outside `1..=100`.
    #[error("limit must be between 1 and {MAX_LIMIT}, got {limit}")]
    LimitOutOfRange {
        /// Rejected page size.
        limit: u32,
    },
    /// Sort direction other than ASC or DESC.
    #[error("order must be ASC or DESC, got '{value}'")]
    InvalidOrder {
        /// Rejected input.
        value: String,
    },
    /// Sort field not accepted for this resource.
    #[error("orderBy '{value}' is not supported (expected one of: {allowed})")]
    UnsupportedOrderBy {
        /// Rejected field.
        value: String,
        /// Comma separated accepted fields.
        allowed: String,
    },
}

/// Paging, sorting, and filtering for list calls.
///
/// The client sends these values as given; call [`ListParams::validate`] first to
/// reject out-of-range input locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Zero-based page index.
    pub page_index: u32,
    /// Page size.
    pub limit: u32,
    /// Sort direction.
    pub order: SortOrder,
    /// Sort field.
    pub order_by: String,
    /// Extra query entries; a key matching a paging key replaces it.
    pub filter: BTreeMap<String, String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page_index: 0,
            limit: DEFAULT_LIMIT,
            order: SortOrder::Desc,
            order_by: DEFAULT_ORDER_BY.to_string(),
            filter: BTreeMap::new(),
        }
    }
}

impl ListParams {
    /// Add a filter entry.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    /// Check the limit range and the sort field against `allowed_order_by`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self, allowed_order_by: &[&str]) -> Result<(), ValidationError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(ValidationError::LimitOutOfRange { limit: self.limit });
        }
        if !allowed_order_by.contains(&self.order_by.as_str()) {
            return Err(ValidationError::UnsupportedOrderBy {
                value: self.order_by.clone(),
                allowed: allowed_order_by.join(", "),
            });
        }
        Ok(())
    }

    /// Query pairs: `pageIndex`, `limit`, `order`, `orderBy`, then filter entries.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = vec![
            ("pageIndex".into(), self.page_index.to_string()),
            ("limit".into(), self.limit.to_string()),
            ("order".into(), self.order.as_str().into()),
            ("orderBy".into(), self.order_by.clone()),
        ];
        for (key, value) in &self.filter {
            match query.iter_mut().find(|(existing, _)| existing == key) {
                Some(entry) => entry.1.clone_from(value),
                None => query.push((key.clone(), value.clone())),
            }
        }
        query
    }
}
