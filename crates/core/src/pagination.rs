//! Page arithmetic for the result list.
//!
//! Everything here is pure: the search controller uses it to turn page
//! numbers into offsets, and front ends use [`PaginationView`] to render
//! the page bar.

use std::fmt;

use serde::Serialize;

/// Number of dogs requested per page.
pub const PAGE_SIZE: u32 = 40;

/// Maximum number of consecutive page numbers shown in the page bar.
pub const MAX_WINDOW: u32 = 5;

/// One slot of the page bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum PageItem {
    /// Selectable page number.
    Page(u32),
    /// Gap marker; never selectable.
    Ellipsis,
}

impl PageItem {
    /// Page this slot navigates to, `None` for the ellipsis.
    pub fn target(&self) -> Option<u32> {
        match self {
            PageItem::Page(n) => Some(*n),
            PageItem::Ellipsis => None,
        }
    }
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => write!(f, "…"),
        }
    }
}

/// `ceil(total / page_size)`. A zero page size yields zero pages.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Whether the page bar should be shown at all.
pub fn is_paginated(total: u64, page_size: u32) -> bool {
    total_pages(total, page_size) > 1
}

/// 1-based `(first, last)` item numbers shown on `current_page`.
///
/// Returns `(0, 0)` for an empty result.
pub fn visible_range(current_page: u32, page_size: u32, total: u64) -> (u64, u64) {
    if total == 0 || page_size == 0 {
        return (0, 0);
    }
    let page = current_page.max(1) as u64;
    let size = page_size as u64;
    let last = (page * size).min(total);
    let first = ((page - 1) * size + 1).min(last);
    (first, last)
}

/// Item offset of the first dog on `page` (page 0 is treated as page 1).
pub fn offset_for(page: u32, page_size: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}

/// Page numbers to display around `current_page`.
///
/// When everything fits in `max_window` all pages are listed. Otherwise a
/// window of `max_window` pages is centered on the current page and
/// shifted to stay inside `[1, total_pages]`; the first and last pages are
/// pinned outside the window behind an ellipsis when not already covered.
pub fn page_window(current_page: u32, total_pages: u32, max_window: u32) -> Vec<PageItem> {
    if total_pages <= max_window {
        return (1..=total_pages).map(PageItem::Page).collect();
    }
    let max_window = max_window.max(1);

    let mut start = current_page.saturating_sub(max_window / 2).max(1);
    let mut end = start + max_window - 1;
    if end > total_pages {
        end = total_pages;
        start = end.saturating_sub(max_window - 1).max(1);
    }

    let mut items = Vec::with_capacity(max_window as usize + 4);
    if start > 1 {
        items.push(PageItem::Page(1));
        items.push(PageItem::Ellipsis);
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total_pages {
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total_pages));
    }
    items
}

/// Navigation guard: only a different page inside `[1, total_pages]`.
pub fn can_navigate(current_page: u32, target_page: u32, total_pages: u32) -> bool {
    target_page != current_page && target_page >= 1 && target_page <= total_pages
}

/// Everything a front end needs to draw the page bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub first_item: u64,
    pub last_item: u64,
    pub items: Vec<PageItem>,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl PaginationView {
    /// Build the view, or `None` when pagination is suppressed.
    pub fn build(total: u64, page_size: u32, current_page: u32) -> Option<Self> {
        if !is_paginated(total, page_size) {
            return None;
        }
        let pages = total_pages(total, page_size);
        let current_page = current_page.clamp(1, pages);
        let (first_item, last_item) = visible_range(current_page, page_size, total);

        Some(Self {
            current_page,
            total_pages: pages,
            total,
            first_item,
            last_item,
            items: page_window(current_page, pages, MAX_WINDOW),
            prev_enabled: current_page > 1,
            next_enabled: current_page < pages,
        })
    }

    /// "Showing dogs 41 to 80 of 1,285"
    pub fn range_label(&self) -> String {
        format!(
            "Showing dogs {} to {} of {}",
            self.first_item,
            self.last_item,
            group_thousands(self.total)
        )
    }
}

/// `1285` as `1,285`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
