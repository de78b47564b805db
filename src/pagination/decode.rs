//! # Pagination Decoding
//!
//! Turns transport input into a `PaginationRequest`. Two shapes are accepted:
//!
//! - an encoded blob: URL-safe base64 of a JSON pagination object
//! - discrete query-string fields (`offset`, `limit`, `sort`, ...)
//!
//! Defaulting happens here and in the request accessors; sort-order
//! validation happens only here.

use std::collections::HashMap;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::errors::{DecodeError, DecodeResult};
use super::operator::Operator;
use super::request::{FilterClause, PaginationRequest, SortOrder, MAX_COUNT};

/// Query parameter carrying an encoded pagination blob
pub const BLOB_PARAM: &str = "p";

/// Wire form of a pagination object
#[derive(Debug, Default, Deserialize)]
struct WirePagination {
    #[serde(default, alias = "Offset")]
    offset: Option<u64>,
    #[serde(default, alias = "Limit")]
    limit: Option<u64>,
    #[serde(default, alias = "Search")]
    search: Option<String>,
    #[serde(default, alias = "Sort")]
    sort: Option<String>,
    #[serde(default, alias = "Order")]
    order: Option<String>,
    #[serde(default, alias = "Next")]
    next: Option<String>,
    #[serde(default, alias = "Prev")]
    prev: Option<String>,
    #[serde(default, alias = "Filters")]
    filters: Option<Vec<WireFilter>>,
}

/// Wire form of a filter clause; the operator stays a raw token until validated
#[derive(Debug, Deserialize)]
struct WireFilter {
    #[serde(alias = "Field")]
    field: String,
    #[serde(alias = "Operator")]
    operator: String,
    #[serde(default, alias = "Value")]
    value: Value,
}

impl WireFilter {
    fn into_clause(self) -> DecodeResult<FilterClause> {
        let operator: Operator = self.operator.parse()?;
        Ok(FilterClause::new(self.field, operator, self.value))
    }
}

impl WirePagination {
    fn into_request(self) -> DecodeResult<PaginationRequest> {
        let offset = check_count("offset", self.offset.unwrap_or_default())
            .map_err(DecodeError::InvalidData)?;
        let limit = check_count("limit", self.limit.unwrap_or_default())
            .map_err(DecodeError::InvalidData)?;
        let order = parse_order(self.order.as_deref().unwrap_or_default())?;

        let filters = self
            .filters
            .unwrap_or_default()
            .into_iter()
            .map(WireFilter::into_clause)
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(PaginationRequest::new()
            .with_offset(offset)
            .with_limit(limit)
            .with_search(self.search.unwrap_or_default())
            .with_sort_field(self.sort.unwrap_or_default())
            .with_order(Some(order))
            .with_next(self.next.unwrap_or_default())
            .with_prev(self.prev.unwrap_or_default())
            .with_filters(filters))
    }
}

impl PaginationRequest {
    /// Decode a URL-safe base64 JSON pagination blob.
    ///
    /// Padded input is expected; unpadded input is accepted as well.
    pub fn decode_blob(encoded: &str) -> DecodeResult<Self> {
        let encoded = encoded.trim();
        let bytes = URL_SAFE
            .decode(encoded)
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .map_err(|e| {
                debug!(error = %e, "rejected pagination blob encoding");
                DecodeError::InvalidEncoding(e.to_string())
            })?;

        let wire: WirePagination = serde_json::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "rejected pagination blob payload");
            DecodeError::InvalidData(e.to_string())
        })?;

        wire.into_request().map_err(|e| {
            debug!(error = %e, "rejected pagination blob contents");
            e
        })
    }

    /// Decode a JSON pagination object that is not base64 encoded
    pub fn from_json(value: Value) -> DecodeResult<Self> {
        let wire: WirePagination =
            serde_json::from_value(value).map_err(|e| DecodeError::InvalidData(e.to_string()))?;
        wire.into_request()
    }

    /// Decode discrete query-string fields.
    ///
    /// If the blob parameter `p` is present it wins and the other fields are
    /// ignored. `filters` is a JSON array of `{field, operator, value}`.
    ///
    /// Fields are checked in a fixed order (offset, limit, filters, order,
    /// operators), so the same input always reports the same error.
    pub fn from_query_params(params: &HashMap<String, String>) -> DecodeResult<Self> {
        if let Some(blob) = params.get(BLOB_PARAM) {
            return Self::decode_blob(blob);
        }

        let text = |key: &str| params.get(key).cloned();

        let wire = WirePagination {
            offset: params.get("offset").map(|v| parse_unsigned("offset", v)).transpose()?,
            limit: params.get("limit").map(|v| parse_unsigned("limit", v)).transpose()?,
            search: text("search"),
            sort: text("sort"),
            order: text("order"),
            next: text("next"),
            prev: text("prev"),
            filters: params.get("filters").map(|v| parse_filters(v)).transpose()?,
        };

        wire.into_request()
    }
}

/// Empty order means ascending; anything else must be a canonical token
fn parse_order(token: &str) -> DecodeResult<SortOrder> {
    if token.is_empty() {
        return Ok(SortOrder::Ascending);
    }

    SortOrder::from_token(token).ok_or_else(|| {
        debug!(order = token, "rejected sort order");
        DecodeError::InvalidOrder(token.to_string())
    })
}

fn parse_unsigned(name: &str, value: &str) -> DecodeResult<u64> {
    let parsed: u64 = value.trim().parse().map_err(|_| {
        debug!(param = name, value, "rejected numeric query parameter");
        DecodeError::InvalidQueryParam(format!("Invalid {}: {}", name, value))
    })?;
    check_count(name, parsed).map_err(DecodeError::InvalidQueryParam)
}

/// Offsets and limits must fit the store's signed 64-bit counters
fn check_count(name: &str, value: u64) -> Result<u64, String> {
    if value > MAX_COUNT {
        debug!(param = name, value, "rejected out-of-range count");
        return Err(format!("{} {} exceeds {}", name, value, MAX_COUNT));
    }
    Ok(value)
}

fn parse_filters(value: &str) -> DecodeResult<Vec<WireFilter>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(value).map_err(|e| {
        debug!(error = %e, "rejected filters query parameter");
        DecodeError::InvalidData(format!("filters: {}", e))
    })
}
