//! Page-number pagination

/// Which page of a listing to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,

    /// Items per page (at least 1)
    pub page_size: usize,
}

impl PageRequest {
    /// Build a request, clamping `page` to ≥ 1 and `page_size` to `1..=max_page_size`
    pub fn new(page: usize, page_size: usize, max_page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_page_size.max(1)),
        }
    }

    /// Number of items to skip, or `None` if it overflows a `u64`
    pub fn offset(&self) -> Option<u64> {
        (self.page as u64 - 1).checked_mul(self.page_size as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Total items across all pages
    pub total: u64,

    /// 1-based page number
    pub page: usize,

    /// Requested page size
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Assemble a page for `request`
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Whether a later page holds more items
    pub fn has_next(&self) -> bool {
        (self.page as u64).saturating_mul(self.page_size as u64) < self.total
    }

    /// Convert every item, keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
