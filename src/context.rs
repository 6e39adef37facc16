use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    ast::{Operator, QueryAst},
    visitors::{
        alias::AliasResolver,
        validation::{ValidationOptions, ValidationResult},
    },
};

/// Outcome of calling an external resolver.
///
/// Resolvers never raise into a pass; failures come back as values and are
/// treated like a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    NotFound,
    /// The resolver itself failed (timeout, backend error, ...)
    Failed(String),
}

impl Resolution {
    pub fn resolved(self) -> Option<String> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::NotFound | Resolution::Failed(_) => None,
        }
    }
}

impl From<Option<String>> for Resolution {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(value) => Resolution::Resolved(value),
            None => Resolution::NotFound,
        }
    }
}

impl<E: std::fmt::Display> From<Result<Option<String>, E>> for Resolution {
    fn from(value: Result<Option<String>, E>) -> Self {
        match value {
            Ok(value) => value.into(),
            Err(error) => Resolution::Failed(error.to_string()),
        }
    }
}

/// `field -> resolved field`
pub type FieldResolver = Arc<dyn Fn(&str, &QueryContext) -> Resolution + Send + Sync>;

/// `include name -> query text`
pub type IncludeResolver = Arc<dyn Fn(&str) -> Resolution + Send + Sync>;

/// What kind of expression the tree holds; changes how operations are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    #[default]
    Query,
    Aggregation,
    Sort,
}

/// Per-run state shared by every pass of a pipeline.
///
/// Holds configuration for this run plus the validation result the passes
/// accumulate into. Build one per query; pipelines themselves stay immutable.
#[derive(Default)]
pub struct QueryContext {
    pub default_operator: Operator,
    /// Fields an unqualified term searches; empty means "the default field".
    pub default_fields: Vec<String>,
    pub query_type: QueryType,
    pub validation_options: ValidationOptions,
    alias_resolver: Option<AliasResolver>,
    field_resolver: Option<FieldResolver>,
    include_resolver: Option<IncludeResolver>,
    alternate_inverted_criteria: Option<QueryAst>,
    validation: ValidationResult,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_operator(mut self, operator: Operator) -> Self {
        self.default_operator = operator;
        self
    }

    pub fn with_default_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self.validation.query_type = query_type;
        self
    }

    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    pub fn with_alias_resolver(mut self, resolver: impl Into<AliasResolver>) -> Self {
        self.alias_resolver = Some(resolver.into());
        self
    }

    pub fn with_field_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str, &QueryContext) -> Resolution + Send + Sync + 'static,
    {
        self.field_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_include_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Resolution + Send + Sync + 'static,
    {
        self.include_resolver = Some(Arc::new(resolver));
        self
    }

    /// Clause OR-ed into every node the inversion pass negates.
    pub fn with_alternate_inverted_criteria(mut self, criteria: QueryAst) -> Self {
        self.alternate_inverted_criteria = Some(criteria);
        self
    }

    pub fn alias_resolver(&self) -> Option<&AliasResolver> {
        self.alias_resolver.as_ref()
    }

    pub fn field_resolver(&self) -> Option<&FieldResolver> {
        self.field_resolver.as_ref()
    }

    pub fn include_resolver(&self) -> Option<&IncludeResolver> {
        self.include_resolver.as_ref()
    }

    pub fn alternate_inverted_criteria(&self) -> Option<&QueryAst> {
        self.alternate_inverted_criteria.as_ref()
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    pub fn validation_mut(&mut self) -> &mut ValidationResult {
        &mut self.validation
    }

    /// Takes the accumulated result, leaving a fresh one behind.
    pub fn take_validation(&mut self) -> ValidationResult {
        let query_type = self.query_type;
        let mut fresh = ValidationResult::default();
        fresh.query_type = query_type;
        std::mem::replace(&mut self.validation, fresh)
    }
}
