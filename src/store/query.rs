//! Simple equality-filter query type shared by all backends.

use serde_json::Value as JsonValue;

const DEFAULT_LIMIT: usize = 100;

/// Filter + ordering + pagination for collection queries.
///
/// Only conjunctive equality filters are supported; that covers every
/// lookup the engine performs (runs by flow and subject, orders and
/// deliveries by contact, templates by group).
#[derive(Debug, Clone)]
pub struct Query {
    filters: Vec<(String, JsonValue)>,
    order_by: Vec<(String, bool)>,
    limit: usize,
    offset: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Add an equality filter on a column.
    pub fn filter(
        mut self,
        column: &str,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    /// Add an ordering column; `rev` orders descending.
    pub fn order(
        mut self,
        column: &str,
        rev: bool,
    ) -> Self {
        self.order_by.push((column.to_string(), rev));
        self
    }

    pub fn limit(
        mut self,
        limit: usize,
    ) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn offset(
        mut self,
        offset: usize,
    ) -> Self {
        self.offset = offset;
        self
    }

    pub fn filters(&self) -> &[(String, JsonValue)] {
        &self.filters
    }

    pub fn order_by(&self) -> &[(String, bool)] {
        &self.order_by
    }

    pub fn get_limit(&self) -> usize {
        self.limit
    }

    pub fn get_offset(&self) -> usize {
        self.offset
    }
}
