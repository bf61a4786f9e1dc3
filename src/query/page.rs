use std::ops::Range;

use crate::error::{Result, TentlyError};

pub const PAGE_SIZES: &[usize] = &[5, 10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub fn check_page_size(size: usize) -> Result<usize> {
    if PAGE_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(TentlyError::InvalidPageSize(size))
    }
}

/// The next allowed page size, wrapping around.
pub fn next_page_size(size: usize) -> usize {
    let idx = PAGE_SIZES.iter().position(|s| *s == size).unwrap_or(0);
    PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Indices into the sorted sequence shown on this page.
    pub range: Range<usize>,
    pub total_pages: usize,
    /// The requested page after clamping into `1..=total_pages`.
    pub current_page: usize,
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    len.div_ceil(size).max(1)
}

pub fn paginate(len: usize, page_size: usize, requested_page: usize) -> Page {
    let size = page_size.max(1);
    let total_pages = total_pages(len, size);
    let current_page = requested_page.clamp(1, total_pages);
    let start = ((current_page - 1) * size).min(len);
    let end = (current_page * size).min(len);
    Page {
        range: start..end,
        total_pages,
        current_page,
    }
}
