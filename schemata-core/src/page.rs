//! List paging.

use serde::Serialize;

pub const DEFAULT_LIMIT: u32 = 5;
pub const DEFAULT_OFFSET: u32 = 0;

/// Limit/offset window for list queries. `limit` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    limit: u32,
    offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl Page {
    /// A page with the given window; a zero limit falls back to the default.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
            offset,
        }
    }

    /// Build a page from raw query parameters.
    ///
    /// Missing, non-numeric or out-of-range values fall back to the defaults
    /// independently of each other.
    pub fn from_params(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|&v| v >= 1)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_LIMIT);
        let offset = offset
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|&v| v >= 0)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_OFFSET);
        Self { limit, offset }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}
