//! Pagination request model
//!
//! A `PaginationRequest` is built once per incoming call (usually by one of
//! the decoders) and is read-only afterwards. Accessors apply the defaulting
//! rules; the stored values are never rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::operator::Operator;

/// Default limit if not specified (or specified as zero)
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest offset or limit the store accepts (signed 64-bit counters)
pub const MAX_COUNT: u64 = i64::MAX as u64;

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    /// Parse one of the two canonical tokens
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "asc" => Some(SortOrder::Ascending),
            "desc" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// A single (field, operator, value) filter clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Field to filter on
    pub field: String,

    /// Comparison operator
    pub operator: Operator,

    /// Value to compare against (scalar or list of scalars)
    pub value: Value,
}

impl FilterClause {
    /// Create a new filter clause
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality clause
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::Equal, value)
    }

    /// Create a not-equal clause
    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::NotEqual, value)
    }

    /// Create a greater than clause
    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::GreaterThan, value)
    }

    /// Create a less than clause
    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Operator::LessThan, value)
    }

    /// Create a pattern match clause
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, Operator::Like, Value::String(pattern.into()))
    }

    /// Create an "in list" clause
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, Operator::In, Value::Array(values))
    }

    /// Create a "not in list" clause
    pub fn not_in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, Operator::NotIn, Value::Array(values))
    }
}

/// Decoded pagination parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationRequest {
    offset: u64,
    limit: u64,
    search: String,
    sort: String,
    order: Option<SortOrder>,
    next: String,
    prev: String,
    filters: Vec<FilterClause>,
    apply_limit: bool,
    use_external_search_index: bool,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 0,
            search: String::new(),
            sort: String::new(),
            order: None,
            next: String::new(),
            prev: String::new(),
            filters: Vec::new(),
            apply_limit: true,
            use_external_search_index: false,
        }
    }
}

impl PaginationRequest {
    /// Creates an empty request: offset 0, default limit, no sort, no filters
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset, saturating at `MAX_COUNT`
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset.min(MAX_COUNT);
        self
    }

    /// Sets the limit, saturating at `MAX_COUNT`
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit.min(MAX_COUNT);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the sort field and order
    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = field.into();
        self.order = Some(order);
        self
    }

    /// Sets the sort field, leaving the order unset
    pub fn with_sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort = field.into();
        self
    }

    pub fn with_order(mut self, order: Option<SortOrder>) -> Self {
        self.order = order;
        self
    }

    pub fn with_next(mut self, cursor: impl Into<String>) -> Self {
        self.next = cursor.into();
        self
    }

    pub fn with_prev(mut self, cursor: impl Into<String>) -> Self {
        self.prev = cursor.into();
        self
    }

    /// Appends a filter clause
    pub fn with_filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    /// Appends several filter clauses, preserving their order
    pub fn with_filters(mut self, clauses: impl IntoIterator<Item = FilterClause>) -> Self {
        self.filters.extend(clauses);
        self
    }

    /// Omit skip/limit from the compiled plan (count-style queries)
    pub fn without_limit(mut self) -> Self {
        self.apply_limit = false;
        self
    }

    /// Marks the result set as already restricted by an external search index
    pub fn with_external_search_index(mut self, enabled: bool) -> Self {
        self.use_external_search_index = enabled;
        self
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the limit, or `DEFAULT_LIMIT` when the stored limit is zero
    pub fn limit(&self) -> u64 {
        self.limit_or(DEFAULT_LIMIT)
    }

    /// Returns the limit, or `default` when the stored limit is zero
    pub fn limit_or(&self, default: u64) -> u64 {
        if self.limit == 0 {
            default
        } else {
            self.limit
        }
    }

    /// The limit exactly as decoded
    pub fn raw_limit(&self) -> u64 {
        self.limit
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    /// Returns the sort order, ascending when unset
    pub fn order(&self) -> SortOrder {
        self.order.unwrap_or_default()
    }

    pub fn next(&self) -> &str {
        &self.next
    }

    pub fn prev(&self) -> &str {
        &self.prev
    }

    pub fn filters(&self) -> &[FilterClause] {
        &self.filters
    }

    pub fn applies_limit(&self) -> bool {
        self.apply_limit
    }

    pub fn uses_external_search_index(&self) -> bool {
        self.use_external_search_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_defaults_when_zero() {
        let req = PaginationRequest::new();
        assert_eq!(req.limit(), 10);
        assert_eq!(req.raw_limit(), 0);

        let req = PaginationRequest::new().with_limit(25);
        assert_eq!(req.limit(), 25);
    }

    #[test]
    fn test_limit_or_custom_default() {
        let req = PaginationRequest::new();
        assert_eq!(req.limit_or(50), 50);
        assert_eq!(req.with_limit(3).limit_or(50), 3);
    }

    #[test]
    fn test_counts_saturate() {
        let req = PaginationRequest::new()
            .with_offset(u64::MAX)
            .with_limit(u64::MAX);
        assert_eq!(req.offset(), MAX_COUNT);
        assert_eq!(req.limit(), MAX_COUNT);
        assert_eq!(MAX_COUNT, i64::MAX as u64);
    }

    #[test]
    fn test_order_defaults_to_ascending() {
        let req = PaginationRequest::new().with_sort_field("name");
        assert_eq!(req.order(), SortOrder::Ascending);

        let req = PaginationRequest::new().with_sort("name", SortOrder::Descending);
        assert_eq!(req.order(), SortOrder::Descending);
    }

    #[test]
    fn test_defaults() {
        let req = PaginationRequest::new();
        assert_eq!(req.offset(), 0);
        assert_eq!(req.search(), "");
        assert_eq!(req.sort(), "");
        assert!(req.filters().is_empty());
        assert!(req.applies_limit());
        assert!(!req.uses_external_search_index());
    }

    #[test]
    fn test_filters_keep_order() {
        let req = PaginationRequest::new()
            .with_filter(FilterClause::eq("a", json!(1)))
            .with_filters(vec![
                FilterClause::gt("b", json!(2)),
                FilterClause::like("c", "x"),
            ]);

        let fields: Vec<&str> = req.filters().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_order_tokens() {
        assert_eq!(SortOrder::from_token("asc"), Some(SortOrder::Ascending));
        assert_eq!(SortOrder::from_token("desc"), Some(SortOrder::Descending));
        assert_eq!(SortOrder::from_token("DESC"), None);
        assert_eq!(SortOrder::Descending.as_str(), "desc");
    }

    #[test]
    fn test_filter_clause_serde() {
        let clause: FilterClause = serde_json::from_value(json!({
            "field": "age",
            "operator": "gte",
            "value": 18
        }))
        .unwrap();

        assert_eq!(clause, FilterClause::new("age", Operator::GreaterThanOrEqual, json!(18)));
    }
}
