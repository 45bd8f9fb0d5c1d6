//! Offset pagination.

use serde::Serialize;

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Page used when none (or a non-positive one) is requested.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Size used when none (or a non-positive one) is requested.
    pub const DEFAULT_SIZE: u32 = 10;
    /// Upper bound on page size.
    pub const MAX_SIZE: u32 = 100;

    /// Build a request from raw query values, falling back to defaults for
    /// missing or non-positive values and capping the size.
    #[must_use]
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page
            .filter(|p| *p > 0)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(Self::DEFAULT_PAGE);
        let size = size
            .filter(|s| *s > 0)
            .and_then(|s| u32::try_from(s).ok())
            .map_or(Self::DEFAULT_SIZE, |s| s.min(Self::MAX_SIZE));
        Self { page, size }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching items.
    pub total: u64,
    /// The request that produced this page.
    #[serde(skip)]
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Number of pages needed to show `total` items.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.request.size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!((req.page(), req.size()), (1, 10));
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let req = PageRequest::new(Some(0), Some(-5));
        assert_eq!((req.page(), req.size()), (1, 10));
    }

    #[test]
    fn test_size_is_capped() {
        assert_eq!(PageRequest::new(Some(1), Some(10_000)).size(), 100);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Page<()> = Page {
            items: vec![],
            total: 21,
            request: PageRequest::new(Some(1), Some(10)),
        };
        assert_eq!(page.total_pages(), 3);

        let empty: Page<()> = Page {
            items: vec![],
            total: 0,
            request: PageRequest::default(),
        };
        assert_eq!(empty.total_pages(), 0);
    }
}
