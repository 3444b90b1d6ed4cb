use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort direction for list queries.
///
/// Only the exact strings `"asc"` and `"desc"` are recognised, anything else
/// falls back to ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Self {
        match value {
            "desc" => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page, page size, sort direction and free-text search for a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationFilter {
    /// 1-based page number
    pub page: u64,
    pub limit: u64,
    pub sort: SortDirection,
    pub search: String,
}

impl Default for PaginationFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: SortDirection::Asc,
            search: String::new(),
        }
    }
}

/// Largest offset or limit handed to storage; SQL engines bind them as `i64`.
pub const MAX_QUERY_BOUND: u64 = i64::MAX as u64;

/// Case folding shared by stored search keys and search terms, so every
/// backend compares the same strings.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

impl PaginationFilter {
    /// Page and limit are clamped to at least 1, limit to at most
    /// [`MAX_QUERY_BOUND`].
    pub fn new(search: impl Into<String>, limit: u64, page: u64, sort: &str) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_QUERY_BOUND),
            sort: SortDirection::parse(sort),
            search: search.into(),
        }
    }

    /// `(page - 1) * limit`, saturating at [`MAX_QUERY_BOUND`].
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1)
            .saturating_mul(self.limit)
            .min(MAX_QUERY_BOUND)
    }

    /// Row limit for storage queries, capped at [`MAX_QUERY_BOUND`].
    pub fn query_limit(&self) -> u64 {
        self.limit.clamp(1, MAX_QUERY_BOUND)
    }

    /// Case-folded search term, `None` when the search is blank.
    pub fn search_term(&self) -> Option<String> {
        let trimmed = self.search.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(fold_case(trimmed))
        }
    }

    /// Case-insensitive substring match used by the in-memory store.
    pub fn matches_any(&self, haystacks: &[&str]) -> bool {
        match self.search_term() {
            None => true,
            Some(needle) => haystacks.iter().any(|h| fold_case(h).contains(&needle)),
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
