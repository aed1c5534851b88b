//! Offset pagination shared by every list endpoint.
//!
//! # Invariants
//! - Pages are 1-based.
//! - Page size defaults to 12 and clamps to 100.

const DEFAULT_PAGE_SIZE: u32 = 12;
const MAX_PAGE_SIZE: u32 = 100;

/// Requested page; constructed through [`PageRequest::new`] so size limits
/// always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PageRequest {
    /// `page` of 0 is treated as 1; `page_size` of 0 falls back to default.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: normalize_page_size(page_size),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One page of results plus the total row count of the unpaginated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.count
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// A page past the end is out of range, except page 1 of an empty set.
    pub fn is_out_of_range(&self) -> bool {
        self.page > 1 && self.items.is_empty()
    }
}

/// Normalizes a requested page size according to the list contract.
pub fn normalize_page_size(page_size: Option<u32>) -> u32 {
    match page_size {
        Some(0) | None => DEFAULT_PAGE_SIZE,
        Some(value) if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        Some(value) => value,
    }
}
