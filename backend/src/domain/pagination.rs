//! Offset pagination helpers shared by every list endpoint.
//!
//! Embedded collections are loaded in full with their parent aggregate, so the
//! skip/take happens in memory; store-level listings use the same contract.

use serde::Deserialize;
use shared::PaginationMeta;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query-string parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
    pub skip: usize,
}

/// Normalize raw page/limit inputs: page >= 1, limit clamped to 1..=100.
pub fn parse_pagination(query: &PageQuery) -> PageParams {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    PageParams {
        page,
        limit,
        skip: ((page - 1) * limit) as usize,
    }
}

/// Compute the pagination block for a list response.
pub fn pagination_meta(params: PageParams, total_items: u64) -> PaginationMeta {
    let total_pages = ((total_items + params.limit as u64 - 1) / params.limit as u64) as u32;
    PaginationMeta {
        current_page: params.page,
        total_pages,
        total_items,
        items_per_page: params.limit,
        has_next_page: params.page < total_pages,
        has_prev_page: params.page > 1,
    }
}

/// Apply skip/take to an already filtered and sorted collection.
pub fn paginate<T: Clone>(items: &[T], params: PageParams) -> Vec<T> {
    items
        .iter()
        .skip(params.skip)
        .take(params.limit as usize)
        .cloned()
        .collect()
}
