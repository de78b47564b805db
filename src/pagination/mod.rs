//! # Pagination Request Model
//!
//! The decoded representation of offset/limit/sort/search/filter clauses,
//! plus the decoders that build it from transport input.

mod decode;
mod errors;
mod operator;
mod request;

pub use decode::BLOB_PARAM;
pub use errors::{DecodeError, DecodeResult};
pub use operator::Operator;
pub use request::{FilterClause, PaginationRequest, SortOrder, DEFAULT_LIMIT, MAX_COUNT};
