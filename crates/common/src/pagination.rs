//! Page/limit normalization and the paginated response envelope.

use serde::Serialize;

/// Upper bound for any page size.
pub const MAX_LIMIT: u64 = 50;

/// Default page size for listing, inquiry and report queries.
pub const DEFAULT_LIMIT: u64 = 10;

/// Default page size for the audit log.
pub const AUDIT_DEFAULT_LIMIT: u64 = 20;

/// Highest page that keeps the offset within Postgres' `BIGINT` range.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT + 1;

/// A normalized page request. `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number.
    pub page: u64,
    /// Items per page.
    pub limit: u64,
}

impl PageParams {
    /// Normalize already-parsed values, falling back to defaults when absent.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u64) -> Self {
        let page = page.map_or(1, |p| (p.max(1) as u64).min(MAX_PAGE));
        let limit = limit.map_or(default_limit, |l| l.clamp(1, MAX_LIMIT as i64) as u64);
        Self { page, limit }
    }

    /// Normalize raw query-string values. Anything non-numeric counts as absent.
    #[must_use]
    pub fn from_raw(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(limit), default_limit)
    }

    /// Rows to skip before this page, capped at `i64::MAX`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        if offset > i64::MAX as u64 {
            i64::MAX as u64
        } else {
            offset
        }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Paginated response body: `{items, total, page, limit, totalPages}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    /// Current page.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// `ceil(total / limit)`.
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Wrap one page of items.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, params: PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total.div_ceil(params.limit),
        }
    }

    /// Convert every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::from_raw(None, None, DEFAULT_LIMIT);
        assert_eq!(params, PageParams { page: 1, limit: 10 });
        assert_eq!(params.offset(), 0);

        let params = PageParams::from_raw(None, None, AUDIT_DEFAULT_LIMIT);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(Some(0), Some(500), DEFAULT_LIMIT);
        assert_eq!(params, PageParams { page: 1, limit: 50 });

        let params = PageParams::new(Some(-3), Some(0), DEFAULT_LIMIT);
        assert_eq!(params, PageParams { page: 1, limit: 1 });

        let params = PageParams::new(Some(3), Some(10), DEFAULT_LIMIT);
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_huge_page_stays_in_range() {
        let params = PageParams::from_raw(Some("9223372036854775807"), Some("50"), DEFAULT_LIMIT);
        assert_eq!(params.page, MAX_PAGE);
        assert!(params.offset() <= i64::MAX as u64);

        let params = PageParams {
            page: u64::MAX,
            limit: MAX_LIMIT,
        };
        assert_eq!(params.offset(), i64::MAX as u64);

        let params = PageParams { page: 0, limit: 10 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_non_numeric_falls_back() {
        let params = PageParams::from_raw(Some("abc"), Some(""), DEFAULT_LIMIT);
        assert_eq!(params, PageParams::default());

        let params = PageParams::from_raw(Some(" 2 "), Some("5"), DEFAULT_LIMIT);
        assert_eq!(params, PageParams { page: 2, limit: 5 });
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(Paginated::new(vec![0; 10], 21, params).total_pages, 3);
        assert_eq!(Paginated::new(Vec::<u8>::new(), 0, params).total_pages, 0);
        assert_eq!(Paginated::new(vec![0; 10], 20, params).total_pages, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let page = Paginated::new(vec!["a"], 1, PageParams::default());
        let value = serde_json::to_value(&page).unwrap_or_default();
        assert_eq!(value["totalPages"], 1);
        assert_eq!(value["items"][0], "a");
    }
}
