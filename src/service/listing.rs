//! Collection query options derived from query items: sort keys and paging.

use crate::config::ModelDescriptor;
use crate::request::QueryItems;
use crate::store::{SortKey, SortOrder};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub take: u64,
    pub skip: u64,
}

/// One sort key per query item naming a scalar field, in query order.
/// Only the literal `asc` sorts ascending.
pub fn sorting_options(model: &ModelDescriptor, query: &QueryItems) -> Vec<SortKey> {
    query
        .iter()
        .filter(|(key, _)| model.field(key).map(|f| !f.is_relation()).unwrap_or(false))
        .map(|(key, value)| SortKey {
            field: key.to_string(),
            order: if value == "asc" { SortOrder::Asc } else { SortOrder::Desc },
        })
        .collect()
}

/// `page` (default 1) and `limit` (default 10). The fetch size is capped at 30 but the
/// offset uses the requested size, so `limit=100&page=2` skips 100 rows.
pub fn pagination(query: &QueryItems) -> Pagination {
    let page = query
        .get("page")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(1)
        .max(1);
    let limit = query
        .get("limit")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    Pagination {
        take: limit.min(MAX_PAGE_SIZE),
        skip: (page - 1).saturating_mul(limit),
    }
}
