//! Page envelope returned by listing endpoints.

use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Number of matching records across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        Self {
            items,
            total,
            page: page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_round_up() {
        let page = Paginated::new(vec![1, 2], 51, 2, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Paginated::<i32>::new(vec![], 0, 0, 25).page, 1);
        assert_eq!(Paginated::<i32>::new(vec![], 0, 1, 25).total_pages, 0);
    }

    #[test]
    fn map_keeps_paging() {
        let page = Paginated::new(vec![1, 2], 2, 1, 10).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.per_page, 10);
    }
}
