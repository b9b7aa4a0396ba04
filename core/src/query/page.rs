//! PaginateStage: cut one fixed-size page out of a sequence.

use crate::error::{ConsoleError, ConsoleResult};
use serde::Serialize;

/// Page sizes offered by the listing screens.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];

/// A validated page request: `page >= 1`, `page_size > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    page: usize,
    page_size: usize,
}

impl PageSpec {
    pub fn new(page: usize, page_size: usize) -> ConsoleResult<Self> {
        if page == 0 {
            return Err(ConsoleError::InvalidPage { page });
        }
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize);
        }
        Ok(Self { page, page_size })
    }

    /// From state that was validated when it was set; zeros lift to 1.
    pub(crate) fn from_state(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: usize) -> ConsoleResult<Self> {
        Self::new(1, page_size)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Zero-based index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// `ceil(len / page_size)`, never less than one page.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Bring `page` back into `[1, total_pages]` after the sequence changed size.
pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(len, page_size))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// Zero-based, inclusive. Clipped to `total_items`.
    pub start_index: usize,
    /// Zero-based, exclusive. Clipped to `total_items`.
    pub end_index: usize,
}

impl<R> Page<R> {
    /// 1-based inclusive range for "Showing X to Y of Z"; `(0, 0)` when empty.
    pub fn showing(&self) -> (usize, usize) {
        if self.items.is_empty() {
            (0, 0)
        } else {
            (self.start_index + 1, self.end_index)
        }
    }

    pub fn summary(&self) -> String {
        let (from, to) = self.showing();
        format!("Showing {from} to {to} of {} entries", self.total_items)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Run the paginate stage. A page past the end yields an empty slice.
pub fn paginate<R: Clone>(records: &[R], spec: PageSpec) -> Page<R> {
    let total_items = records.len();
    let start_index = spec.offset().min(total_items);
    let end_index = spec
        .offset()
        .saturating_add(spec.page_size)
        .min(total_items);
    Page {
        items: records[start_index..end_index].to_vec(),
        page: spec.page,
        page_size: spec.page_size,
        total_items,
        total_pages: total_pages(total_items, spec.page_size),
        start_index,
        end_index,
    }
}
