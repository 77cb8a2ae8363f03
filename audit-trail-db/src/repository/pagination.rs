/// Offset-based page of audit records
///
/// # Example
/// ```
/// use audit_trail_db::repository::pagination::PageRequest;
///
/// let first = PageRequest::new(20, 0);
/// let second = PageRequest::for_page(20, 2);
/// assert_eq!(second.offset, 20);
/// assert_eq!(second.page_number(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of items to return
    pub limit: usize,
    /// Number of items to skip
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Request for a 1-based page number; page 0 is treated as page 1.
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        Self {
            limit: page_size,
            offset: (page_number.max(1) - 1) * page_size,
        }
    }

    /// Get the page number (1-based) for this request
    pub fn page_number(&self) -> usize {
        page_number(self.limit, self.offset)
    }

    /// Cuts this page out of an already ordered, complete result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items.into_iter().skip(self.offset).take(self.limit).collect();
        Page::new(items, total, self.limit, self.offset)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Paginated response containing items and metadata
///
/// # Example
/// ```
/// use audit_trail_db::repository::pagination::Page;
///
/// let page = Page::new(vec![1, 2, 3], 100, 20, 0);
///
/// assert!(page.has_more());
/// assert_eq!(page.page_number(), 1);
/// assert_eq!(page.total_pages(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    /// Check if there are more pages after this one
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    pub fn page_number(&self) -> usize {
        page_number(self.limit, self.offset)
    }

    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    pub fn is_last_page(&self) -> bool {
        !self.has_more()
    }

    /// Converts the items, keeping the page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

fn page_number(limit: usize, offset: usize) -> usize {
    if limit == 0 {
        1
    } else {
        (offset / limit) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_reports_total_and_slice() {
        let page = PageRequest::for_page(2, 2).paginate(vec!['a', 'b', 'c', 'd', 'e']);

        assert_eq!(page.items, vec!['c', 'd']);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_more());
        assert!(!page.is_first_page());
    }

    #[test]
    fn test_offset_past_end_is_empty_last_page() {
        let page = PageRequest::new(10, 30).paginate(vec![1, 2, 3]);

        assert!(page.items.is_empty());
        assert!(page.is_last_page());
        assert_eq!(page.page_number(), 4);
    }
}
