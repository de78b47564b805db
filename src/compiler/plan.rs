//! Query plan structures
//!
//! The compiler output is typed; rendering to BSON documents happens only
//! when the store-access layer asks for it.

use bson::{Bson, Document};

use super::config::DuplicateFieldPolicy;

/// Condition applied to a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// field = value
    Eq(Bson),
    /// field != value
    Ne(Bson),
    /// field > value
    Gt(Bson),
    /// field >= value
    Gte(Bson),
    /// field < value
    Lt(Bson),
    /// field <= value
    Lte(Bson),
    /// field is one of values
    In(Vec<Bson>),
    /// field is none of values
    NotIn(Vec<Bson>),
    /// field matches pattern
    Regex(Bson),
    /// field does not match pattern
    NotRegex(Bson),
}

impl Condition {
    /// Returns the store operator name
    pub fn op_name(&self) -> &'static str {
        match self {
            Condition::Eq(_) => "$eq",
            Condition::Ne(_) => "$ne",
            Condition::Gt(_) => "$gt",
            Condition::Gte(_) => "$gte",
            Condition::Lt(_) => "$lt",
            Condition::Lte(_) => "$lte",
            Condition::In(_) => "$in",
            Condition::NotIn(_) => "$nin",
            Condition::Regex(_) => "$regex",
            Condition::NotRegex(_) => "$not",
        }
    }

    /// Render as a condition document, e.g. `{"$eq": "admin"}`
    pub fn to_document(&self) -> Document {
        let operand = match self {
            Condition::Eq(v)
            | Condition::Ne(v)
            | Condition::Gt(v)
            | Condition::Gte(v)
            | Condition::Lt(v)
            | Condition::Lte(v)
            | Condition::Regex(v) => v.clone(),
            Condition::In(values) | Condition::NotIn(values) => Bson::Array(values.clone()),
            Condition::NotRegex(v) => {
                let mut regex = Document::new();
                regex.insert("$regex", v.clone());
                Bson::Document(regex)
            }
        };

        let mut doc = Document::new();
        doc.insert(self.op_name(), operand);
        doc
    }
}

/// All conditions compiled for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConditions {
    pub field: String,
    pub conditions: Vec<Condition>,
}

/// Compiled filter predicate.
///
/// Fields keep the position of their first clause. Under
/// `DuplicateFieldPolicy::LastWriteWins` every field holds exactly one
/// condition.
///
/// Field names are not escaped. When rendered, a clause on a field named
/// `$text` replaces the search term, and a conjunction replaces a clause on
/// a field named `$and`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    text_search: Option<String>,
    fields: Vec<FieldConditions>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text search term
    pub fn set_text_search(&mut self, term: impl Into<String>) {
        self.text_search = Some(term.into());
    }

    pub fn text_search(&self) -> Option<&str> {
        self.text_search.as_deref()
    }

    /// Adds a condition for `field` according to `policy`
    pub fn insert(&mut self, field: &str, condition: Condition, policy: DuplicateFieldPolicy) {
        match self.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => match policy {
                DuplicateFieldPolicy::LastWriteWins => existing.conditions = vec![condition],
                DuplicateFieldPolicy::Conjunction => existing.conditions.push(condition),
            },
            None => self.fields.push(FieldConditions {
                field: field.to_string(),
                conditions: vec![condition],
            }),
        }
    }

    /// Returns the last condition compiled for `field`
    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions(field).last()
    }

    /// Returns every condition compiled for `field`
    pub fn conditions(&self, field: &str) -> &[Condition] {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.conditions.as_slice())
            .unwrap_or(&[])
    }

    /// Field names in output order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    /// Number of distinct fields (the text search is not counted)
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there is neither a field condition nor a text search
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.text_search.is_none()
    }

    /// Render as a filter document.
    ///
    /// Fields with several conditions are emitted as `{"$and": [{field: c1}, ...]}`.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();

        if let Some(term) = &self.text_search {
            let mut search = Document::new();
            search.insert("$search", term.clone());
            doc.insert("$text", search);
        }

        let mut conjunction = Vec::new();
        for entry in &self.fields {
            match entry.conditions.as_slice() {
                [single] => {
                    doc.insert(entry.field.clone(), single.to_document());
                }
                many => {
                    for condition in many {
                        let mut clause = Document::new();
                        clause.insert(entry.field.clone(), condition.to_document());
                        conjunction.push(Bson::Document(clause));
                    }
                }
            }
        }

        if !conjunction.is_empty() {
            doc.insert("$and", conjunction);
        }

        doc
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Store direction value: 1 ascending, -1 descending
    pub fn value(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Render as `{field: 1}` or `{field: -1}`
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(self.field.clone(), self.direction.value());
        doc
    }
}

/// Options for a flat find-style query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<SortSpec>,
}

impl FindOptions {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(skip) = self.skip {
            doc.insert("skip", count(skip));
        }
        if let Some(limit) = self.limit {
            doc.insert("limit", count(limit));
        }
        if let Some(sort) = &self.sort {
            doc.insert("sort", sort.to_document());
        }
        doc
    }
}

/// Aggregation pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Skip(u64),
    Limit(u64),
    Sort(SortSpec),
}

impl Stage {
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        match self {
            Stage::Skip(n) => doc.insert("$skip", count(*n)),
            Stage::Limit(n) => doc.insert("$limit", count(*n)),
            Stage::Sort(sort) => doc.insert("$sort", sort.to_document()),
        };
        doc
    }
}

/// Pagination half of a plan, shaped by the compile mode
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutput {
    /// Flat skip/limit/sort options
    Find(FindOptions),
    /// Ordered stages: skip, limit, sort
    Pipeline(Vec<Stage>),
}

/// Immutable compiled query plan
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Filter predicate (returned separately from any stages)
    pub predicate: Predicate,
    /// Pagination and sort, as options or stages
    pub output: PlanOutput,
}

impl QueryPlan {
    /// Find options, when compiled in flat mode
    pub fn find_options(&self) -> Option<&FindOptions> {
        match &self.output {
            PlanOutput::Find(options) => Some(options),
            PlanOutput::Pipeline(_) => None,
        }
    }

    /// Pipeline stages; empty in flat mode
    pub fn stages(&self) -> &[Stage] {
        match &self.output {
            PlanOutput::Pipeline(stages) => stages,
            PlanOutput::Find(_) => &[],
        }
    }

    /// Sort directive, whichever the output shape
    pub fn sort(&self) -> Option<&SortSpec> {
        match &self.output {
            PlanOutput::Find(options) => options.sort.as_ref(),
            PlanOutput::Pipeline(stages) => stages.iter().find_map(|stage| match stage {
                Stage::Sort(sort) => Some(sort),
                _ => None,
            }),
        }
    }

    /// Rows to skip, whichever the output shape
    pub fn skip(&self) -> Option<u64> {
        match &self.output {
            PlanOutput::Find(options) => options.skip,
            PlanOutput::Pipeline(stages) => stages.iter().find_map(|stage| match stage {
                Stage::Skip(n) => Some(*n),
                _ => None,
            }),
        }
    }

    /// Maximum rows, whichever the output shape
    pub fn take(&self) -> Option<u64> {
        match &self.output {
            PlanOutput::Find(options) => options.limit,
            PlanOutput::Pipeline(stages) => stages.iter().find_map(|stage| match stage {
                Stage::Limit(n) => Some(*n),
                _ => None,
            }),
        }
    }

    /// Filter document for the store
    pub fn filter_document(&self) -> Document {
        self.predicate.to_document()
    }

    /// Pipeline stage documents; empty in flat mode
    pub fn pipeline_documents(&self) -> Vec<Document> {
        self.stages().iter().map(Stage::to_document).collect()
    }

    /// Whole plan as one document: `{filter, options}` or `{filter, pipeline}`
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("filter", self.filter_document());
        match &self.output {
            PlanOutput::Find(options) => {
                doc.insert("options", options.to_document());
            }
            PlanOutput::Pipeline(_) => {
                doc.insert("pipeline", self.pipeline_documents());
            }
        }
        doc
    }
}

fn count(n: u64) -> Bson {
    Bson::Int64(i64::try_from(n).unwrap_or(i64::MAX))
}
