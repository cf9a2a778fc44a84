//! Page window arithmetic for the post feed.
//!
//! Caller-supplied numbers are floored and clamped rather than rejected; only
//! non-finite values fail. The window metadata is derived from a single
//! `total` so it always agrees with itself within one request.

use super::DomainError;
use serde::Serialize;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;
pub const DEFAULT_PAGE: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: u32,
    page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl Pagination {
    /// Normalizes raw numeric input.
    ///
    /// `limit` becomes `clamp(floor(limit), 1, 100)` and `page` becomes
    /// `max(1, floor(page))`. NaN and infinities are validation errors.
    pub fn from_raw(limit: Option<f64>, page: Option<f64>) -> Result<Self, DomainError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) if !raw.is_finite() => return Err(DomainError::InvalidLimit),
            // `as` saturates, so huge values land on the bound
            Some(raw) => (raw.floor().clamp(1.0, MAX_LIMIT as f64)) as u32,
        };
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) if !raw.is_finite() => return Err(DomainError::InvalidPage),
            Some(raw) => (raw.floor().max(1.0)) as u64,
        };
        Ok(Self { limit, page })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(u64::from(self.limit))
    }
}

/// One page of results plus metadata about the whole filtered collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
}

impl<T> PageWindow<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: u64) -> Self {
        let total_pages = total_pages(total, pagination.limit());
        Self {
            items,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
            total_pages,
            has_next_page: pagination.page() < total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageWindow<U> {
        PageWindow {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
        }
    }
}

/// `max(1, ceil(total / limit))`
pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1))).max(1)
}
