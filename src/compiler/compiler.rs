//! Query compiler
//!
//! Translates a `PaginationRequest` into a `QueryPlan`. Compilation is pure:
//! no I/O, no shared state, no logging. The same request and mode always
//! produce the same plan.
//!
//! Failure is atomic. The first clause that cannot be compiled aborts the
//! whole call and no partial plan is returned.

use bson::Bson;
use serde_json::Value;

use super::config::{CompilerConfig, SearchSuppression};
use super::errors::{CompileError, CompileResult};
use super::plan::{Condition, FindOptions, PlanOutput, Predicate, QueryPlan, SortSpec, Stage};
use crate::coercion::ValueCoercer;
use crate::pagination::{FilterClause, Operator, PaginationRequest, SortOrder};

/// Output shape of a compiled plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// Filter plus flat skip/limit/sort options
    #[default]
    FlatFilter,
    /// Filter plus ordered aggregation stages
    Pipeline,
}

impl CompileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileMode::FlatFilter => "flat",
            CompileMode::Pipeline => "pipeline",
        }
    }
}

/// Compiles pagination requests into query plans
pub struct QueryCompiler<'a> {
    config: &'a CompilerConfig,
    coercer: Box<dyn ValueCoercer>,
}

impl<'a> QueryCompiler<'a> {
    /// Creates a compiler using the coercion strategy named in `config`
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self {
            config,
            coercer: config.coercion.coercer(),
        }
    }

    /// Creates a compiler with a custom coercer, ignoring `config.coercion`
    pub fn with_coercer(config: &'a CompilerConfig, coercer: impl ValueCoercer + 'static) -> Self {
        Self {
            config,
            coercer: Box::new(coercer),
        }
    }

    /// Compiles a request into a plan of the given shape
    pub fn compile(&self, request: &PaginationRequest, mode: CompileMode) -> CompileResult<QueryPlan> {
        let predicate = self.build_predicate(request, mode)?;
        let sort = sort_spec(request);

        let output = match mode {
            CompileMode::FlatFilter => PlanOutput::Find(self.find_options(request, sort)),
            CompileMode::Pipeline => PlanOutput::Pipeline(self.stages(request, sort)),
        };

        Ok(QueryPlan { predicate, output })
    }

    fn find_options(&self, request: &PaginationRequest, sort: Option<SortSpec>) -> FindOptions {
        let (skip, limit) = if request.applies_limit() {
            (
                Some(request.offset()),
                Some(request.limit_or(self.config.default_limit)),
            )
        } else {
            (None, None)
        };

        FindOptions { skip, limit, sort }
    }

    /// Stages in fixed order: skip, limit, sort
    fn stages(&self, request: &PaginationRequest, sort: Option<SortSpec>) -> Vec<Stage> {
        let mut stages = Vec::with_capacity(3);

        if request.applies_limit() {
            stages.push(Stage::Skip(request.offset()));
            stages.push(Stage::Limit(request.limit_or(self.config.default_limit)));
        }

        if let Some(sort) = sort {
            stages.push(Stage::Sort(sort));
        }

        stages
    }

    fn build_predicate(&self, request: &PaginationRequest, mode: CompileMode) -> CompileResult<Predicate> {
        let mut predicate = Predicate::new();

        if !request.search().is_empty() && !self.suppresses_search(request, mode) {
            predicate.set_text_search(request.search());
        }

        for clause in request.filters() {
            let condition = self.compile_clause(clause)?;
            predicate.insert(&clause.field, condition, self.config.duplicate_fields);
        }

        Ok(predicate)
    }

    /// Whether the external search index replaces the native text condition
    fn suppresses_search(&self, request: &PaginationRequest, mode: CompileMode) -> bool {
        if !request.uses_external_search_index() {
            return false;
        }

        match (mode, self.config.search_suppression) {
            (CompileMode::Pipeline, _) => true,
            (CompileMode::FlatFilter, SearchSuppression::AllModes) => true,
            (CompileMode::FlatFilter, SearchSuppression::PipelineOnly) => false,
        }
    }

    fn compile_clause(&self, clause: &FilterClause) -> CompileResult<Condition> {
        let field = clause.field.as_str();
        let value = &clause.value;

        let condition = match clause.operator {
            Operator::Equal => Condition::Eq(self.scalar_operand(field, value)),
            Operator::NotEqual => Condition::Ne(self.scalar_operand(field, value)),
            Operator::GreaterThan => Condition::Gt(json_to_bson(value)),
            Operator::GreaterThanOrEqual => Condition::Gte(json_to_bson(value)),
            Operator::LessThan => Condition::Lt(json_to_bson(value)),
            Operator::LessThanOrEqual => Condition::Lte(json_to_bson(value)),
            Operator::In => Condition::In(self.sequence_operand(field, Operator::In, value)?),
            Operator::NotIn => Condition::NotIn(self.sequence_operand(field, Operator::NotIn, value)?),
            Operator::Like => Condition::Regex(json_to_bson(value)),
            Operator::NotLike => Condition::NotRegex(json_to_bson(value)),
        };

        Ok(condition)
    }

    /// Equality operand: strings go through the coercer, everything else is literal
    fn scalar_operand(&self, field: &str, value: &Value) -> Bson {
        match value {
            Value::String(s) => self
                .coercer
                .coerce_scalar(field, s)
                .unwrap_or_else(|| Bson::String(s.clone())),
            other => json_to_bson(other),
        }
    }

    /// Membership operand.
    ///
    /// - a string becomes a one-element sequence
    /// - a non-empty all-string sequence goes through the coercer
    /// - any other sequence passes through unchanged
    /// - anything else is rejected
    fn sequence_operand(&self, field: &str, op: Operator, value: &Value) -> CompileResult<Vec<Bson>> {
        match value {
            Value::String(s) => Ok(self.coerce_strings(field, &[s.as_str()])),
            Value::Array(items) => {
                let strings: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
                match strings {
                    Some(strings) if !strings.is_empty() => Ok(self.coerce_strings(field, &strings)),
                    _ => Ok(items.iter().map(json_to_bson).collect()),
                }
            }
            _ => Err(CompileError::InvalidSequenceFormat(op)),
        }
    }

    fn coerce_strings(&self, field: &str, strings: &[&str]) -> Vec<Bson> {
        self.coercer
            .coerce_sequence(field, strings)
            .unwrap_or_else(|| strings.iter().map(|s| Bson::String(s.to_string())).collect())
    }
}

/// Compiles with object-id coercion and otherwise default settings
pub fn compile(request: &PaginationRequest, mode: CompileMode) -> CompileResult<QueryPlan> {
    let config = CompilerConfig::reference();
    QueryCompiler::new(&config).compile(request, mode)
}

fn sort_spec(request: &PaginationRequest) -> Option<SortSpec> {
    if request.sort().is_empty() {
        return None;
    }

    Some(match request.order() {
        SortOrder::Descending => SortSpec::desc(request.sort()),
        SortOrder::Ascending => SortSpec::asc(request.sort()),
    })
}

/// Literal JSON to BSON; no extended-JSON interpretation
fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_bson(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::ObjectIdCoercer;
    use crate::compiler::config::DuplicateFieldPolicy;
    use bson::doc;
    use bson::oid::ObjectId;
    use serde_json::json;

    const ID: &str = "65f1a2b3c4d5e6f708192a3b";

    fn reference() -> CompilerConfig {
        CompilerConfig::reference()
    }

    #[test]
    fn test_empty_request() {
        let config = reference();
        let plan = QueryCompiler::new(&config)
            .compile(&PaginationRequest::new(), CompileMode::FlatFilter)
            .unwrap();

        assert!(plan.predicate.is_empty());
        assert_eq!(plan.filter_document(), doc! {});
        assert_eq!(plan.skip(), Some(0));
        assert_eq!(plan.take(), Some(10));
        assert_eq!(plan.sort(), None);
    }

    #[test]
    fn test_comparisons_are_not_coerced() {
        let config = reference();
        let request = PaginationRequest::new().with_filter(FilterClause::gt("_id", json!(ID)));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("_id"),
            Some(&Condition::Gt(Bson::String(ID.to_string())))
        );
    }

    #[test]
    fn test_like_is_not_coerced() {
        let config = reference();
        let request = PaginationRequest::new()
            .with_filter(FilterClause::like("ref", ID))
            .with_filter(FilterClause::new("name", Operator::NotLike, json!("^tmp")));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.filter_document(),
            doc! {
                "ref": { "$regex": ID },
                "name": { "$not": { "$regex": "^tmp" } }
            }
        );
    }

    #[test]
    fn test_equal_coerces_identifier() {
        let config = reference();
        let request = PaginationRequest::new()
            .with_filter(FilterClause::eq("owner", json!(ID)))
            .with_filter(FilterClause::ne("name", json!("bob")));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("owner"),
            Some(&Condition::Eq(Bson::ObjectId(ObjectId::parse_str(ID).unwrap())))
        );
        assert_eq!(
            plan.predicate.get("name"),
            Some(&Condition::Ne(Bson::String("bob".into())))
        );
    }

    #[test]
    fn test_default_config_keeps_strings() {
        let config = CompilerConfig::default();
        let request = PaginationRequest::new().with_filter(FilterClause::eq("owner", json!(ID)));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("owner"),
            Some(&Condition::Eq(Bson::String(ID.to_string())))
        );
    }

    #[test]
    fn test_custom_coercer() {
        struct OwnerOnly;

        impl ValueCoercer for OwnerOnly {
            fn coerce_scalar(&self, field: &str, value: &str) -> Option<Bson> {
                if field == "owner" {
                    ObjectIdCoercer.coerce_scalar(field, value)
                } else {
                    None
                }
            }
        }

        let config = CompilerConfig::default();
        let request = PaginationRequest::new()
            .with_filter(FilterClause::eq("owner", json!(ID)))
            .with_filter(FilterClause::eq("token", json!(ID)));

        let plan = QueryCompiler::with_coercer(&config, OwnerOnly)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert!(matches!(plan.predicate.get("owner"), Some(Condition::Eq(Bson::ObjectId(_)))));
        assert!(matches!(plan.predicate.get("token"), Some(Condition::Eq(Bson::String(_)))));
    }

    #[test]
    fn test_in_wraps_scalar_string() {
        let config = reference();
        let request = PaginationRequest::new().with_filter(FilterClause::new(
            "age",
            Operator::In,
            json!("18,19,20"),
        ));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("age"),
            Some(&Condition::In(vec![Bson::String("18,19,20".into())]))
        );
    }

    #[test]
    fn test_in_scalar_identifier() {
        let config = reference();
        let request =
            PaginationRequest::new().with_filter(FilterClause::new("_id", Operator::In, json!(ID)));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("_id"),
            Some(&Condition::In(vec![Bson::ObjectId(ObjectId::parse_str(ID).unwrap())]))
        );
    }

    #[test]
    fn test_in_mixed_sequence_passes_through() {
        let config = reference();
        let request = PaginationRequest::new()
            .with_filter(FilterClause::in_list("code", vec![json!(ID), json!(7), json!(true)]));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(
            plan.predicate.get("code"),
            Some(&Condition::In(vec![
                Bson::String(ID.into()),
                Bson::Int64(7),
                Bson::Boolean(true)
            ]))
        );
    }

    #[test]
    fn test_in_empty_sequence() {
        let config = reference();
        let request = PaginationRequest::new().with_filter(FilterClause::in_list("tags", vec![]));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(plan.predicate.get("tags"), Some(&Condition::In(vec![])));
    }

    #[test]
    fn test_invalid_sequence_format() {
        let config = reference();
        for (op, message) in [
            (Operator::In, "invalid format for 'in' operator"),
            (Operator::NotIn, "invalid format for 'not in' operator"),
        ] {
            let request = PaginationRequest::new()
                .with_filter(FilterClause::eq("ok", json!("fine")))
                .with_filter(FilterClause::new("age", op, json!(18)));

            let err = QueryCompiler::new(&config)
                .compile(&request, CompileMode::FlatFilter)
                .unwrap_err();
            assert_eq!(err, CompileError::InvalidSequenceFormat(op));
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_invalid_sequence_format_rejects_objects_and_null() {
        let config = reference();
        for value in [json!({"a": 1}), Value::Null, json!(false)] {
            let request =
                PaginationRequest::new().with_filter(FilterClause::new("x", Operator::NotIn, value));
            assert!(QueryCompiler::new(&config)
                .compile(&request, CompileMode::Pipeline)
                .is_err());
        }
    }

    #[test]
    fn test_conjunction_policy() {
        let config = reference().with_duplicate_fields(DuplicateFieldPolicy::Conjunction);
        let request = PaginationRequest::new()
            .with_filter(FilterClause::new("age", Operator::GreaterThanOrEqual, json!(18)))
            .with_filter(FilterClause::lt("age", json!(65)));

        let plan = QueryCompiler::new(&config)
            .compile(&request, CompileMode::FlatFilter)
            .unwrap();
        assert_eq!(plan.predicate.conditions("age").len(), 2);
        assert_eq!(
            plan.filter_document(),
            doc! { "$and": [ { "age": { "$gte": 18_i64 } }, { "age": { "$lt": 65_i64 } } ] }
        );
    }

    #[test]
    fn test_search_suppression_all_modes() {
        let config = reference().with_search_suppression(SearchSuppression::AllModes);
        let request = PaginationRequest::new()
            .with_search("foo")
            .with_external_search_index(true);

        let compiler = QueryCompiler::new(&config);
        for mode in [CompileMode::FlatFilter, CompileMode::Pipeline] {
            let plan = compiler.compile(&request, mode).unwrap();
            assert_eq!(plan.predicate.text_search(), None);
        }
    }

    #[test]
    fn test_config_default_limit() {
        let mut config = reference();
        config.default_limit = 50;
        let plan = QueryCompiler::new(&config)
            .compile(&PaginationRequest::new(), CompileMode::Pipeline)
            .unwrap();
        assert_eq!(plan.stages(), &[Stage::Skip(0), Stage::Limit(50)]);
    }

    #[test]
    fn test_json_to_bson() {
        assert_eq!(json_to_bson(&json!(1.5)), Bson::Double(1.5));
        assert_eq!(json_to_bson(&json!(-3)), Bson::Int64(-3));
        assert_eq!(json_to_bson(&Value::Null), Bson::Null);
        // Extended JSON is not interpreted
        assert_eq!(
            json_to_bson(&json!({"$oid": ID})),
            Bson::Document(doc! { "$oid": ID })
        );
    }
}
