use std::collections::HashSet;

use tracing::trace;

use crate::{
    ast::{GroupNode, Negation, NodeId, Operator, Prefix, QueryAst, QueryNode},
    context::QueryContext,
    error::{QueryError, Result},
    visitor::ChainableVisitor,
    visitors::referenced_fields::referenced_fields_within,
};

/// Rewrites a query into its complement, leaving protected fields alone.
///
/// A group that only references invertible fields is negated as a whole; a
/// group mixing protected and invertible fields has each of its clauses
/// handled on its own, so
///
/// ```text
/// field:value organizationId:value   ->   (NOT field:value) organizationId:value
/// ```
///
/// when `organizationId` is protected. Negating something already negated
/// removes the negation. When the context carries alternate criteria, every
/// negated node becomes `(criteria OR node)`.
///
/// Inversion assumes AND semantics between clauses and refuses to run when
/// the default operator is OR.
#[derive(Debug, Clone, Default)]
pub struct InvertQueryVisitor {
    non_inverted_fields: HashSet<String>,
}

enum Coverage {
    /// Only protected fields
    Protected,
    /// No protected fields
    Invertible,
    Mixed,
}

impl InvertQueryVisitor {
    pub fn new<I, S>(non_inverted_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InvertQueryVisitor {
            non_inverted_fields: non_inverted_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn non_inverted_fields(&self) -> &HashSet<String> {
        &self.non_inverted_fields
    }

    /// `inherited` is the field of the nearest enclosing field group, which
    /// unqualified leaves below `id` search.
    fn coverage(&self, ast: &QueryAst, id: NodeId, inherited: Option<&str>) -> Coverage {
        let fields = referenced_fields_within(ast, id, inherited);
        let protected = fields
            .iter()
            .filter(|field| self.non_inverted_fields.contains(*field))
            .count();
        if protected == fields.len() {
            Coverage::Protected
        } else if protected == 0 {
            Coverage::Invertible
        } else {
            Coverage::Mixed
        }
    }

    fn invert_group(
        &self,
        ast: &mut QueryAst,
        id: NodeId,
        ctx: &QueryContext,
        inherited: Option<&str>,
    ) -> NodeId {
        match self.coverage(ast, id, inherited) {
            Coverage::Protected => id,
            Coverage::Invertible => self.invert_node(ast, id, ctx),
            Coverage::Mixed => {
                let scope = ast
                    .node(id)
                    .field_name()
                    .or(inherited)
                    .map(str::to_string);
                let clauses: Vec<NodeId> = ast.sequence(id).collect();
                for clause in clauses {
                    self.invert_clause(ast, clause, ctx, scope.as_deref());
                }
                id
            }
        }
    }

    fn invert_clause(
        &self,
        ast: &mut QueryAst,
        id: NodeId,
        ctx: &QueryContext,
        inherited: Option<&str>,
    ) -> NodeId {
        if ast.node(id).is_group() {
            return self.invert_group(ast, id, ctx, inherited);
        }
        let field = ast.node(id).field_name().or(inherited).unwrap_or_default();
        if self.non_inverted_fields.contains(field) {
            id
        } else {
            self.invert_node(ast, id, ctx)
        }
    }

    fn invert_node(&self, ast: &mut QueryAst, id: NodeId, ctx: &QueryContext) -> NodeId {
        let inverted = negate(ast, id);
        let Some(criteria) = ctx.alternate_inverted_criteria() else {
            return inverted;
        };

        let alternate = import_criteria(ast, criteria);
        let wrapper = ast.add(QueryNode::group(GroupNode {
            operator: Operator::Or,
            has_parens: true,
            ..GroupNode::default()
        }));
        ast.replace_self(inverted, wrapper);
        ast.set_left(wrapper, Some(alternate));
        ast.set_right(wrapper, Some(inverted));
        wrapper
    }
}

/// Negates one node in place, returning whatever now stands in its position.
fn negate(ast: &mut QueryAst, id: NodeId) -> NodeId {
    let node = ast.node_mut(id);
    if node.negation.is_negated() {
        trace!(node = id.index(), "double negation removed");
        node.negation = Negation::NotNegated;
        return id;
    }
    if node.prefix == Some(Prefix::MustNot) {
        node.prefix = None;
        return id;
    }

    let has_field = node.field_name().is_some();
    let Some(group) = node.as_group_mut() else {
        let wrapper = ast.add(QueryNode::group(GroupNode {
            has_parens: true,
            ..GroupNode::default()
        }));
        ast.wrap(id, wrapper);
        ast.node_mut(id).negation = Negation::Negated;
        trace!(node = id.index(), "clause negated");
        return wrapper;
    };

    if has_field || group.has_parens {
        group.has_parens = true;
        node.negation = Negation::Negated;
        trace!(node = id.index(), "group negated");
        return id;
    }

    // Unparenthesized, field-less group: negate what it holds.
    match (group.left, group.right) {
        (None, None) => id,
        (Some(only), None) | (None, Some(only)) => {
            negate(ast, only);
            id
        }
        (Some(left), Some(right)) => {
            let operator = std::mem::take(&mut group.operator);
            let inner = ast.add(
                QueryNode::group(GroupNode {
                    operator,
                    has_parens: true,
                    ..GroupNode::default()
                })
                .with_negation(Negation::Negated),
            );
            ast.set_left(inner, Some(left));
            ast.set_right(inner, Some(right));
            ast.set_left(id, Some(inner));
            trace!(node = id.index(), "group contents negated");
            id
        }
    }
}

/// Imports the alternate criteria, unwrapping a root that holds one clause.
fn import_criteria(ast: &mut QueryAst, criteria: &QueryAst) -> NodeId {
    let root = criteria.root();
    let root_node = criteria.node(root);
    let single = match root_node.as_group() {
        Some(group) if root_node.field.is_none() && !root_node.negation.is_explicit() => {
            match (group.left, group.right) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        }
        _ => None,
    };

    match single {
        Some(only) => ast.import(criteria, only),
        None => {
            let id = ast.import(criteria, root);
            if let Some(group) = ast.group_mut(id) {
                group.has_parens = true;
            }
            id
        }
    }
}

impl ChainableVisitor for InvertQueryVisitor {
    fn name(&self) -> &'static str {
        "InvertQueryVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        if ctx.default_operator == Operator::Or {
            return Err(QueryError::InvalidOperation(
                "queries cannot be inverted when the default operator is OR".to_string(),
            ));
        }
        if !ast.node(node).is_group() {
            return Err(QueryError::InvalidOperation(
                "inversion must start from a group node".to_string(),
            ));
        }
        Ok(self.invert_group(ast, node, ctx, None))
    }
}
