//! Page-window arithmetic shared by every list endpoint.
//!
//! Windows are computed over an already-loaded, already-filtered result set:
//! `[(page - 1) * page_size, page * page_size)`. A start offset strictly
//! beyond the total is a range error, not an empty page.

use crate::error::ApiError;

/// A resolved window over a result set of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub start: usize,
    pub end: usize,
    pub has_more: bool,
    pub total: usize,
}

/// Compute the window for 1-based `page` of `page_size` items.
pub fn window(total: usize, page: usize, page_size: usize) -> Result<PageWindow, ApiError> {
    if page == 0 || page_size == 0 {
        return Err(ApiError::Validation);
    }
    offset_window(total, (page - 1) * page_size, page_size)
}

/// Compute the window starting at an absolute item offset (cursor-style
/// lists send the number of items already loaded).
pub fn offset_window(total: usize, start: usize, count: usize) -> Result<PageWindow, ApiError> {
    if count == 0 {
        return Err(ApiError::Validation);
    }
    if start > total {
        return Err(ApiError::OutOfRange);
    }

    let has_more = start + count < total;
    let end = if has_more { start + count } else { total };

    Ok(PageWindow {
        start,
        end,
        has_more,
        total,
    })
}

/// Apply a window to a loaded vector, keeping only the visible slice.
pub fn apply<T>(items: Vec<T>, window: PageWindow) -> Vec<T> {
    items
        .into_iter()
        .skip(window.start)
        .take(window.end - window.start)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_has_more() {
        let w = window(25, 1, 10).unwrap();
        assert_eq!((w.start, w.end), (0, 10));
        assert!(w.has_more);
    }

    #[test]
    fn last_partial_page_has_no_more() {
        let w = window(25, 3, 10).unwrap();
        assert_eq!((w.start, w.end), (20, 25));
        assert!(!w.has_more);

        let items: Vec<usize> = (1..=25).collect();
        assert_eq!(apply(items, w), vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn offset_beyond_total_is_a_range_error() {
        assert!(matches!(window(25, 10, 10), Err(ApiError::OutOfRange)));
    }

    #[test]
    fn offset_equal_to_total_is_an_empty_page() {
        // Matches the inclusive bound of the window check: start == total
        // yields an empty final page rather than an error.
        let w = window(20, 3, 10).unwrap();
        assert_eq!((w.start, w.end), (20, 20));
        assert!(!w.has_more);
    }

    #[test]
    fn zero_page_or_size_fails_validation() {
        assert!(matches!(window(25, 0, 10), Err(ApiError::Validation)));
        assert!(matches!(window(25, 1, 0), Err(ApiError::Validation)));
    }

    #[test]
    fn cursor_offsets_window_from_loaded_count() {
        let w = offset_window(7, 5, 5).unwrap();
        assert_eq!((w.start, w.end), (5, 7));
        assert!(!w.has_more);
    }
}
