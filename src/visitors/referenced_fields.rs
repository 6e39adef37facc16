use std::collections::BTreeSet;

use crate::{
    ast::{GroupNode, NodeId, QueryAst, RangeNode, TermNode},
    visitor::QueryVisitor,
};

/// Collects every field referenced at or below a node.
///
/// A leaf without a field searches the field of its nearest enclosing field
/// group, so `status:(open closed)` references only `status`. Leaves with no
/// field anywhere above them contribute `""`.
#[derive(Debug, Default)]
pub struct ReferencedFieldsVisitor {
    fields: BTreeSet<String>,
    scopes: Vec<Option<String>>,
    inherited: Option<String>,
}

impl ReferencedFieldsVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts below a field group whose field unqualified leaves fall back to.
    pub fn with_inherited_field(field: Option<&str>) -> Self {
        ReferencedFieldsVisitor {
            inherited: field.map(str::to_string),
            ..Self::default()
        }
    }

    fn scope_field(&self) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flatten()
            .next()
            .or(self.inherited.as_ref())
            .map(String::as_str)
    }

    fn add_leaf(&mut self, ast: &QueryAst, id: NodeId) {
        let field = ast
            .node(id)
            .field_name()
            .or_else(|| self.scope_field())
            .unwrap_or_default()
            .to_string();
        self.fields.insert(field);
    }
}

impl QueryVisitor for ReferencedFieldsVisitor {
    type Output = BTreeSet<String>;

    fn enter_group(&mut self, ast: &QueryAst, id: NodeId, _group: &GroupNode) -> bool {
        let field = ast.node(id).field_name().map(str::to_string);
        if let Some(field) = &field {
            self.fields.insert(field.clone());
        }
        self.scopes.push(field);
        true
    }

    fn leave_group(&mut self, _ast: &QueryAst, _id: NodeId, _group: &GroupNode) {
        self.scopes.pop();
    }

    fn visit_term(&mut self, ast: &QueryAst, id: NodeId, _term: &TermNode) {
        self.add_leaf(ast, id);
    }

    fn visit_range(&mut self, ast: &QueryAst, id: NodeId, _range: &RangeNode) {
        self.add_leaf(ast, id);
    }

    fn visit_exists(&mut self, ast: &QueryAst, id: NodeId) {
        self.add_leaf(ast, id);
    }

    fn visit_missing(&mut self, ast: &QueryAst, id: NodeId) {
        self.add_leaf(ast, id);
    }

    fn finish(self) -> BTreeSet<String> {
        self.fields
    }
}

/// Fields referenced by the subtree at `id`.
pub fn referenced_fields(ast: &QueryAst, id: NodeId) -> BTreeSet<String> {
    ReferencedFieldsVisitor::new().run(ast, id)
}

/// Like [`referenced_fields`] for a subtree sitting inside a field group.
pub fn referenced_fields_within(
    ast: &QueryAst,
    id: NodeId,
    inherited: Option<&str>,
) -> BTreeSet<String> {
    ReferencedFieldsVisitor::with_inherited_field(inherited).run(ast, id)
}
