// 📄 Pagination - page size, offsets, page-link sequence

use serde::Serialize;

/// Rows shown per list page, for every list in the dashboard
pub const ITEMS_PER_PAGE: i64 = 6;

/// Requested page numbers below 1 are treated as page 1
pub fn clamp_page(page: i64) -> i64 {
    page.max(1)
}

/// Row offset for a 1-based page number
pub fn offset(page: i64) -> i64 {
    (clamp_page(page) - 1) * ITEMS_PER_PAGE
}

/// `ceil(count / ITEMS_PER_PAGE)`; zero rows means zero pages
pub fn total_pages(count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageItem {
    Page(i64),
    Ellipsis,
}

/// Page links to show for `current` out of `total` pages.
///
/// Small lists show every page. Longer lists keep the first and last pages
/// visible and collapse the rest around the current page.
pub fn generate_pagination(current: i64, total: i64) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    if total <= 0 {
        return Vec::new();
    }

    if total <= 7 {
        return (1..=total).map(Page).collect();
    }

    let current = current.clamp(1, total);

    if current <= 3 {
        return vec![Page(1), Page(2), Page(3), Ellipsis, Page(total - 1), Page(total)];
    }

    if current >= total - 2 {
        return vec![
            Page(1),
            Page(2),
            Ellipsis,
            Page(total - 2),
            Page(total - 1),
            Page(total),
        ];
    }

    vec![
        Page(1),
        Ellipsis,
        Page(current - 1),
        Page(current),
        Page(current + 1),
        Ellipsis,
        Page(total),
    ]
}
