//! Row limits for most-recent-first list endpoints.

use serde::{Deserialize, Serialize};

/// A bounded row count for history and audit listings.
///
/// Deserializes from a plain integer. Values outside `1..=MAX` are clamped
/// rather than rejected so that dashboards asking for "everything" still get
/// a sane page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct ListLimit(u64);

impl ListLimit {
    /// Default number of rows returned when no limit is supplied.
    pub const DEFAULT: u64 = 50;
    /// Upper bound on rows returned in one call.
    pub const MAX: u64 = 500;

    /// Creates a limit, clamping into `1..=MAX`.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        if value == 0 {
            Self(1)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the limit as a `usize` for in-memory slicing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for ListLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<u64> for ListLimit {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<ListLimit> for u64 {
    fn from(limit: ListLimit) -> Self {
        limit.0
    }
}
