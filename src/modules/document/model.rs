use serde_json::{Map, Value};

/// Equality filter on top-level body fields, matched by containment.
pub type Filter = Map<String, Value>;

/// Document body without the server-managed fields.
pub type Body = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Offset/limit window over a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Window for a 1-based page number.
    pub fn for_page(page: u64, limit: u64) -> Self {
        Self { skip: page.saturating_sub(1).saturating_mul(limit), limit }
    }
}

pub fn filter_eq(key: &str, value: impl Into<Value>) -> Filter {
    let mut filter = Filter::new();
    filter.insert(key.to_string(), value.into());
    filter
}
