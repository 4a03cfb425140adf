/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

use crate::config;

/// One page of a listing plus the total number of matching rows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub items: Vec<T>,
}

impl<T> PagedResult<T> {
    pub fn new(paging: Paging, total_count: i64, items: Vec<T>) -> Self {
        Self {
            page: paging.page,
            page_size: paging.page_size,
            total_count,
            items,
        }
    }

    pub fn empty(paging: Paging) -> Self {
        Self::new(paging, 0, Vec::new())
    }
}

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Paging {
    /// `page < 1` becomes 1; a size outside `1..=max` falls back to the default
    pub fn normalize(page: Option<i64>, page_size: Option<i64>, default_size: u32, max_size: u32) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        let page_size = match page_size {
            Some(s) if s >= 1 && s <= max_size as i64 => s as u32,
            _ => default_size,
        };
        Self { page, page_size }
    }

    /// Normalize with the configured default and maximum page size
    pub fn from_query(page: Option<i64>, page_size: Option<i64>) -> Self {
        let api = &config::config().api;
        Self::normalize(page, page_size, api.default_page_size, api.max_page_size)
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_below_one_becomes_one() {
        assert_eq!(Paging::normalize(Some(0), Some(10), 20, 200).page, 1);
        assert_eq!(Paging::normalize(Some(-4), None, 20, 200).page, 1);
        assert_eq!(Paging::normalize(None, None, 20, 200).page, 1);
    }

    #[test]
    fn page_size_out_of_range_falls_back() {
        assert_eq!(Paging::normalize(Some(1), Some(0), 20, 200).page_size, 20);
        assert_eq!(Paging::normalize(Some(1), Some(201), 20, 200).page_size, 20);
        assert_eq!(Paging::normalize(Some(1), Some(200), 20, 200).page_size, 200);
        assert_eq!(Paging::normalize(Some(1), Some(5), 20, 200).page_size, 5);
    }

    #[test]
    fn offset_and_limit() {
        let paging = Paging::normalize(Some(3), Some(25), 20, 200);
        assert_eq!(paging.offset(), 50);
        assert_eq!(paging.limit(), 25);
    }
}
