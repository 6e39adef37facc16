use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ast::{GroupNode, NodeId, OPERATION_TYPE, QueryAst, RangeNode, TermNode, UNRESOLVED_FIELD},
    context::{QueryContext, QueryType},
    error::{QueryError, Result},
    visitor::{ChainableVisitor, QueryVisitor},
};

/// Validation policy.
///
/// Empty allow lists allow everything. A depth ceiling of 0 is unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    pub allowed_fields: BTreeSet<String>,
    pub restricted_fields: BTreeSet<String>,
    pub allowed_operations: BTreeSet<String>,
    pub restricted_operations: BTreeSet<String>,
    pub allow_unresolved_fields: bool,
    pub allow_unresolved_includes: bool,
    pub allow_leading_wildcards: bool,
    pub allowed_max_node_depth: usize,
    /// Turn an invalid result into [`QueryError::Validation`].
    pub should_throw: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            allowed_fields: BTreeSet::new(),
            restricted_fields: BTreeSet::new(),
            allowed_operations: BTreeSet::new(),
            restricted_operations: BTreeSet::new(),
            allow_unresolved_fields: true,
            allow_unresolved_includes: false,
            allow_leading_wildcards: true,
            allowed_max_node_depth: 0,
            should_throw: false,
        }
    }
}

/// Everything the passes learned about a query, plus the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub query_type: QueryType,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub referenced_fields: BTreeSet<String>,
    pub referenced_includes: BTreeSet<String>,
    pub unresolved_fields: BTreeSet<String>,
    pub unresolved_includes: BTreeSet<String>,
    /// operation -> fields it was applied to
    pub operations: BTreeMap<String, BTreeSet<String>>,
    pub max_node_depth: usize,
}

impl Default for ValidationResult {
    fn default() -> Self {
        ValidationResult {
            query_type: QueryType::Query,
            is_valid: true,
            message: None,
            errors: Vec::new(),
            referenced_fields: BTreeSet::new(),
            referenced_includes: BTreeSet::new(),
            unresolved_fields: BTreeSet::new(),
            unresolved_includes: BTreeSet::new(),
            operations: BTreeMap::new(),
            max_node_depth: 0,
        }
    }
}

impl ValidationResult {
    /// Records an error and marks the result invalid.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
        self.message = Some(self.errors.join(", "));
    }

    /// Fields referenced through `operation`, if it was used at all.
    pub fn operation_fields(&self, operation: &str) -> Option<&BTreeSet<String>> {
        self.operations.get(operation)
    }
}

/// Single traversal gathering what the policy is checked against.
struct Collector<'a> {
    ctx: &'a QueryContext,
    depth: usize,
    max_depth: usize,
    operations: Vec<Option<String>>,
    fields: BTreeSet<String>,
    used: BTreeMap<String, BTreeSet<String>>,
    unresolved: BTreeSet<String>,
    leading_wildcards: Vec<String>,
    invalid_regexes: Vec<String>,
}

#[derive(Default)]
struct Collected {
    max_depth: usize,
    fields: BTreeSet<String>,
    operations: BTreeMap<String, BTreeSet<String>>,
    unresolved: BTreeSet<String>,
    leading_wildcards: Vec<String>,
    invalid_regexes: Vec<String>,
}

impl<'a> Collector<'a> {
    fn new(ctx: &'a QueryContext) -> Self {
        Collector {
            ctx,
            depth: 0,
            max_depth: 0,
            operations: Vec::new(),
            fields: BTreeSet::new(),
            used: BTreeMap::new(),
            unresolved: BTreeSet::new(),
            leading_wildcards: Vec::new(),
            invalid_regexes: Vec::new(),
        }
    }

    fn counts_depth(ast: &QueryAst, id: NodeId, group: &GroupNode) -> bool {
        ast.is_root(id) || group.has_parens
    }

    fn inherited_operation(&self) -> Option<String> {
        self.operations.iter().rev().flatten().next().cloned()
    }

    fn visit_leaf(&mut self, ast: &QueryAst, id: NodeId) {
        let node = ast.node(id);
        let fields: Vec<String> = match node.field_name() {
            Some(field) => vec![field.to_string()],
            None if self.ctx.default_fields.is_empty() => vec![String::new()],
            None => self.ctx.default_fields.clone(),
        };

        if ast.annotations().get(&UNRESOLVED_FIELD, id) == Some(&true) {
            self.unresolved.extend(node.field_name().map(str::to_string));
        }

        let operation = ast
            .annotations()
            .get(&OPERATION_TYPE, id)
            .cloned()
            .or_else(|| match self.ctx.query_type {
                QueryType::Query => Some(node.kind.label().to_string()),
                _ => None,
            })
            .or_else(|| self.inherited_operation());

        if let Some(operation) = operation {
            self.used.entry(operation).or_default().extend(fields.iter().cloned());
        }
        self.fields.extend(fields);
    }

    fn finish_collecting(self) -> Collected {
        Collected {
            max_depth: self.max_depth,
            fields: self.fields,
            operations: self.used,
            unresolved: self.unresolved,
            leading_wildcards: self.leading_wildcards,
            invalid_regexes: self.invalid_regexes,
        }
    }
}

impl QueryVisitor for Collector<'_> {
    type Output = Collected;

    fn enter_group(&mut self, ast: &QueryAst, id: NodeId, group: &GroupNode) -> bool {
        if Self::counts_depth(ast, id, group) {
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
        }

        let node = ast.node(id);
        let operation = ast.annotations().get(&OPERATION_TYPE, id).cloned();
        if let Some(field) = node.field_name() {
            self.fields.insert(field.to_string());
            if ast.annotations().get(&UNRESOLVED_FIELD, id) == Some(&true) {
                self.unresolved.insert(field.to_string());
            }
            if let Some(operation) = operation.clone() {
                self.used.entry(operation).or_default().insert(field.to_string());
            }
        }
        self.operations.push(operation);
        true
    }

    fn leave_group(&mut self, ast: &QueryAst, id: NodeId, group: &GroupNode) {
        self.operations.pop();
        if Self::counts_depth(ast, id, group) {
            self.depth -= 1;
        }
    }

    fn visit_term(&mut self, ast: &QueryAst, id: NodeId, term: &TermNode) {
        if term.has_leading_wildcard() {
            self.leading_wildcards.push(term.term.clone());
        }
        if term.is_regex && regex::Regex::new(&term.term).is_err() {
            self.invalid_regexes.push(term.term.clone());
        }
        self.visit_leaf(ast, id);
    }

    fn visit_range(&mut self, ast: &QueryAst, id: NodeId, _range: &RangeNode) {
        self.visit_leaf(ast, id);
    }

    fn visit_exists(&mut self, ast: &QueryAst, id: NodeId) {
        self.visit_leaf(ast, id);
    }

    fn visit_missing(&mut self, ast: &QueryAst, id: NodeId) {
        self.visit_leaf(ast, id);
    }

    fn finish(self) -> Collected {
        self.finish_collecting()
    }
}

/// Accumulates usage statistics and applies the validation policy.
///
/// Policy comes from the context unless the pass was built with its own.
/// Errors recorded by earlier passes (operation typing, includes) are kept,
/// so a result can be invalid before this pass finds anything.
#[derive(Debug, Clone, Default)]
pub struct ValidationVisitor {
    options: Option<ValidationOptions>,
}

impl ValidationVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidationOptions) -> Self {
        ValidationVisitor {
            options: Some(options),
        }
    }

    /// Errors `result` breaks under `options`.
    fn policy_errors(
        options: &ValidationOptions,
        collected: &Collected,
        result: &ValidationResult,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for field in &result.referenced_fields {
            if field.is_empty() {
                continue;
            }
            if !options.allowed_fields.is_empty() && !options.allowed_fields.contains(field) {
                errors.push(format!("Field not allowed: {field}"));
            } else if options.restricted_fields.contains(field) {
                errors.push(format!("Field is restricted: {field}"));
            }
        }

        for operation in result.operations.keys() {
            if !options.allowed_operations.is_empty()
                && !options.allowed_operations.contains(operation)
            {
                errors.push(format!("Operation not allowed: {operation}"));
            } else if options.restricted_operations.contains(operation) {
                errors.push(format!("Operation is restricted: {operation}"));
            }
        }

        if !options.allow_unresolved_fields && !result.unresolved_fields.is_empty() {
            let fields = join(&result.unresolved_fields);
            errors.push(format!("Unresolved fields: {fields}"));
        }

        if !options.allow_unresolved_includes && !result.unresolved_includes.is_empty() {
            let includes = join(&result.unresolved_includes);
            errors.push(format!("Unresolved includes: {includes}"));
        }

        if !options.allow_leading_wildcards {
            for term in &collected.leading_wildcards {
                errors.push(format!("Terms must not start with a wildcard: {term}"));
            }
        }

        for pattern in &collected.invalid_regexes {
            errors.push(format!("Invalid regular expression: {pattern}"));
        }

        if options.allowed_max_node_depth > 0 && result.max_node_depth > options.allowed_max_node_depth {
            errors.push(format!(
                "Query has a node depth of {} but at most {} is allowed",
                result.max_node_depth, options.allowed_max_node_depth
            ));
        }
        errors
    }
}

fn join(values: &BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl ChainableVisitor for ValidationVisitor {
    fn name(&self) -> &'static str {
        "ValidationVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        let collected = Collector::new(ctx).run(ast, node);
        let options = self
            .options
            .clone()
            .unwrap_or_else(|| ctx.validation_options.clone());
        let query_type = ctx.query_type;

        let result = ctx.validation_mut();
        result.query_type = query_type;
        result.max_node_depth = result.max_node_depth.max(collected.max_depth);
        result.referenced_fields.extend(collected.fields.iter().cloned());
        result.unresolved_fields.extend(collected.unresolved.iter().cloned());
        for (operation, fields) in &collected.operations {
            result
                .operations
                .entry(operation.clone())
                .or_default()
                .extend(fields.iter().cloned());
        }

        // A second validation run in the same pipeline reports nothing twice.
        let recorded = result.errors.clone();
        for error in Self::policy_errors(&options, &collected, result) {
            if !recorded.contains(&error) {
                result.add_error(error);
            }
        }
        debug!(
            valid = result.is_valid,
            depth = result.max_node_depth,
            fields = result.referenced_fields.len(),
            "query validated"
        );

        if options.should_throw && !result.is_valid {
            return Err(QueryError::Validation(Box::new(result.clone())));
        }
        Ok(node)
    }
}

/// Runs validation over the whole tree and hands back the result.
///
/// The context is left holding a fresh result.
pub fn validate_query(ast: &mut QueryAst, ctx: &mut QueryContext) -> Result<ValidationResult> {
    let root = ast.root();
    ValidationVisitor::new().accept(ast, root, ctx)?;
    Ok(ctx.take_validation())
}
