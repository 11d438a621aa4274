//! Offset pagination primitives shared by CampusPay backend endpoints.
//!
//! [`PageRequest`] carries a validated page number and page size pair, and
//! [`Slice`] wraps one page of results together with the total number of rows
//! that matched, so list responses can report how much data exists beyond the
//! current page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size applied when a request does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on the page size a single request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Error returned when pagination parameters fall outside the accepted
/// bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The requested page size was zero or exceeded [`MAX_PAGE_SIZE`].
    #[error("page size must be between 1 and {}, got {size}", MAX_PAGE_SIZE)]
    SizeOutOfRange {
        /// Page size the caller asked for.
        size: u32,
    },
}

/// A validated offset pagination request.
///
/// Pages are zero-based: page 0 with size 20 covers the first twenty rows of
/// the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Builds a request for `page` with `size` rows per page.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::SizeOutOfRange`] when `size` is zero or
    /// greater than [`MAX_PAGE_SIZE`].
    pub const fn new(page: u32, size: u32) -> Result<Self, PageRequestError> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(PageRequestError::SizeOutOfRange { size });
        }
        Ok(Self { page, size })
    }

    /// Zero-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Number of rows in a full page.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size
    }

    /// Number of rows to skip before this page begins.
    ///
    /// The product stays well inside `i64` because [`Self::new`] caps the
    /// page size at [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Maximum number of rows this page may hold, as the SQL `LIMIT` operand.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total number of rows that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice<T> {
    /// Rows on this page, in result order.
    pub items: Vec<T>,
    /// Total number of matching rows across all pages.
    pub total: u64,
}

impl<T> Slice<T> {
    /// Wraps a page of `items` with the overall `total` row count.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }

    /// Applies `f` to every item while keeping the total intact.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }

    /// True when this page carries no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of rows on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::first_page(0, 20, 0)]
    #[case::later_page(3, 25, 75)]
    #[case::large_page_number(1_000_000, 100, 100_000_000)]
    fn offset_multiplies_page_by_size(
        #[case] page: u32,
        #[case] size: u32,
        #[case] expected: i64,
    ) -> Result<(), PageRequestError> {
        let request = PageRequest::new(page, size)?;
        assert_eq!(request.offset(), expected);
        Ok(())
    }

    #[rstest]
    #[case::zero(0)]
    #[case::above_cap(MAX_PAGE_SIZE + 1)]
    fn new_rejects_out_of_range_sizes(#[case] size: u32) {
        assert_eq!(
            PageRequest::new(5, size),
            Err(PageRequestError::SizeOutOfRange { size })
        );
    }

    #[test]
    fn default_is_first_page_with_default_size() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(request.limit(), i64::from(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn map_preserves_total_and_order() {
        let slice = Slice::new(vec![1, 2, 3], 7);
        let mapped = slice.map(|value| value * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 7);
        assert!(!mapped.is_empty());
        assert_eq!(mapped.len(), 3);
    }

    #[test]
    fn slice_serialises_items_and_total() -> Result<(), serde_json::Error> {
        let slice = Slice::new(vec!["a", "b"], 9);
        let value = serde_json::to_value(&slice)?;
        assert_eq!(value, serde_json::json!({"items": ["a", "b"], "total": 9}));
        Ok(())
    }

    #[test]
    fn size_error_names_the_bounds() {
        let error = PageRequestError::SizeOutOfRange { size: 0 };
        assert_eq!(
            error.to_string(),
            "page size must be between 1 and 100, got 0"
        );
    }
}
