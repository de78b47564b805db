//! Query Plan Compiler
//!
//! Produces document-store query plans from pagination requests.
//!
//! # Output shapes
//!
//! - `CompileMode::FlatFilter`: filter document plus skip/limit/sort options
//! - `CompileMode::Pipeline`: filter document plus ordered stages
//!   (skip, limit, sort); the filter is never emitted as a stage
//!
//! # Clause combination
//!
//! Clauses are ANDed. Two clauses on the same field follow
//! `DuplicateFieldPolicy`; the default keeps only the later clause.

#[allow(clippy::module_inception)]
mod compiler;
mod config;
mod errors;
mod plan;

pub use compiler::{compile, CompileMode, QueryCompiler};
pub use config::{CompilerConfig, DuplicateFieldPolicy, SearchSuppression};
pub use errors::{CompileError, CompileResult, ConfigError};
pub use plan::{
    Condition, FieldConditions, FindOptions, PlanOutput, Predicate, QueryPlan, SortDirection,
    SortSpec, Stage,
};
