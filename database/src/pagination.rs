use serde::{Deserialize, Serialize};

pub const GALLERY_PAGE_SIZE: usize = 20;

/// A window into an ordered result set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Pagination {
    pub page_size: usize,
    pub start_at: usize,
}

/// Translates 1-indexed page numbers into offsets.
///
/// Page numbers past the last page are not clamped; `navigation` reports
/// whether previous/next pages exist and callers disable links accordingly.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct PageNavigation {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: usize,
    pub next_page: usize,
}

impl Paginator {
    pub fn new(page_size: usize, current_page: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: current_page.max(1),
        }
    }

    /// Parses a raw `page` query value. Missing, non-numeric, or zero values
    /// select the first page.
    pub fn from_query(page: Option<&str>, page_size: usize) -> Self {
        let current_page = page
            .and_then(|page| page.trim().parse::<usize>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);

        Self::new(page_size, current_page)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.current_page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total_count: usize) -> usize {
        total_count.div_ceil(self.page_size)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page_size: self.page_size,
            start_at: self.offset(),
        }
    }

    pub fn navigation(&self, total_count: usize) -> PageNavigation {
        let total_pages = self.total_pages(total_count);
        PageNavigation {
            current_page: self.current_page,
            total_pages,
            has_previous: self.current_page > 1,
            has_next: self.current_page < total_pages,
            previous_page: self.current_page.saturating_sub(1).max(1),
            next_page: self.current_page.saturating_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Paginator, GALLERY_PAGE_SIZE};

    #[test]
    fn total_pages_rounds_up() {
        let paginator = Paginator::new(GALLERY_PAGE_SIZE, 1);
        assert_eq!(paginator.total_pages(45), 3);
        assert_eq!(paginator.total_pages(40), 2);
        assert_eq!(paginator.total_pages(0), 0);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Paginator::new(GALLERY_PAGE_SIZE, 2).offset(), 20);
        assert_eq!(Paginator::new(GALLERY_PAGE_SIZE, 1).offset(), 0);
    }

    #[test]
    fn invalid_page_defaults_to_first() {
        for raw in [None, Some("abc"), Some(""), Some("0"), Some("-3"), Some("2.5")] {
            let paginator = Paginator::from_query(raw, GALLERY_PAGE_SIZE);
            assert_eq!(paginator.current_page(), 1, "{:?}", raw);
            assert_eq!(paginator.offset(), 0);
        }
        assert_eq!(
            Paginator::from_query(Some(" 3 "), GALLERY_PAGE_SIZE).current_page(),
            3
        );
    }

    #[test]
    fn navigation_is_not_clamped() {
        let navigation = Paginator::new(GALLERY_PAGE_SIZE, 2).navigation(45);
        assert_eq!(navigation.total_pages, 3);
        assert!(navigation.has_previous);
        assert!(navigation.has_next);
        assert_eq!(navigation.previous_page, 1);
        assert_eq!(navigation.next_page, 3);

        let last = Paginator::new(GALLERY_PAGE_SIZE, 3).navigation(45);
        assert!(!last.has_next);

        let beyond = Paginator::new(GALLERY_PAGE_SIZE, 7).navigation(45);
        assert_eq!(beyond.current_page, 7);
        assert!(!beyond.has_next);
        assert!(beyond.has_previous);

        let first = Paginator::new(GALLERY_PAGE_SIZE, 1).navigation(45);
        assert!(!first.has_previous);
    }
}
