//! Paginated response envelope

use serde::{Deserialize, Serialize};

use crate::validation::pagination::page_count;

/// One page of items plus totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total rows matching the query, before paging
    pub amount: u64,
    /// Number of pages at the requested page size
    pub pages: u64,
}

impl<T> PaginationResponse<T> {
    pub fn new(data: Vec<T>, count: u64, page_size: u32) -> Self {
        Self {
            data,
            pagination: PaginationMeta {
                amount: count,
                pages: page_count(count, page_size),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_computes_pages() {
        let page = PaginationResponse::new(vec![1, 2, 3], 25, 10);
        assert_eq!(page.pagination, PaginationMeta { amount: 25, pages: 3 });
        assert_eq!(page.data.len(), 3);
    }
}
