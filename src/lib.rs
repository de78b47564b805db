//! querycraft - compiles pagination and filter requests into document-store query plans
//!
//! A request (offset, limit, sort, search, filter clauses) is decoded once
//! per call and handed to the compiler together with an output mode. The
//! compiler is pure: it returns a filter predicate plus either flat find
//! options or ordered pipeline stages, and performs no I/O.
//!
//! ```ignore
//! use querycraft::compiler::{CompileMode, CompilerConfig, QueryCompiler};
//! use querycraft::pagination::PaginationRequest;
//!
//! let request = PaginationRequest::decode_blob(blob)?;
//! let config = CompilerConfig::reference();
//! let plan = QueryCompiler::new(&config).compile(&request, CompileMode::Pipeline)?;
//! let filter = plan.filter_document();
//! let stages = plan.pipeline_documents();
//! ```

pub mod cli;
pub mod coercion;
pub mod compiler;
pub mod pagination;
