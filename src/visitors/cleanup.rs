use tracing::trace;

use crate::{
    ast::{Negation, NodeId, QueryAst},
    context::QueryContext,
    error::Result,
    visitor::{ChainableVisitor, MutatingVisitor, walk_children},
};

/// Structural normalization.
///
/// Children are cleaned before their group, and each group is re-checked
/// until none of the rules apply, so running the pass twice changes nothing.
///
/// - empty non-root groups are removed
/// - a group whose only child is a field-less group absorbs it, merging the
///   two negations
/// - `(x)` becomes `x` for a single leaf; `NOT (x)` keeps the negation and
///   drops only the parentheses, and `NOT (NOT x)` becomes `x`
/// - a link group left holding a single clause is replaced by that clause
///
/// Groups with a field are only ever changed by the absorb rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupQueryVisitor;

enum Step {
    Unchanged,
    Changed,
    /// The group left its position; the id now standing there.
    Moved(NodeId),
}

impl CleanupQueryVisitor {
    pub fn new() -> Self {
        CleanupQueryVisitor
    }

    fn cleanup_group(&self, ast: &mut QueryAst, id: NodeId) -> NodeId {
        loop {
            match self.step(ast, id) {
                Step::Unchanged => return id,
                Step::Changed => continue,
                Step::Moved(position) => return position,
            }
        }
    }

    fn step(&self, ast: &mut QueryAst, id: NodeId) -> Step {
        let Some(group) = ast.group(id) else {
            return Step::Unchanged;
        };
        let is_root = ast.is_root(id);

        let child = match (group.left, group.right) {
            (None, None) if is_root => return Step::Unchanged,
            (None, None) => {
                trace!(node = id.index(), "empty group removed");
                let parent = ast.remove_self(id);
                return Step::Moved(parent.unwrap_or(id));
            }
            (None, Some(right)) => {
                ast.set_left(id, Some(right));
                return Step::Changed;
            }
            (Some(left), None) => left,
            (Some(_), Some(_)) => return Step::Unchanged,
        };

        let node = ast.node(id);
        let child_node = ast.node(child);
        let has_field = node.field.is_some();

        if let Some(inner) = child_node.as_group() {
            if child_node.field.is_some() || child_node.has_modifiers() {
                return Step::Unchanged;
            }
            let negation = node.negation.merge(child_node.negation);
            let has_parens = group.has_parens
                || (inner.has_parens && (!is_root || negation.is_negated()));
            let operator = inner.operator;
            let (left, right) = (inner.left, inner.right);

            trace!(node = id.index(), child = child.index(), "nested group merged");
            ast.set_left(id, None);
            ast.set_left(id, left);
            ast.set_right(id, right);
            let node = ast.node_mut(id);
            node.negation = negation;
            if let Some(group) = node.as_group_mut() {
                group.operator = operator;
                group.has_parens = has_parens;
            }
            return Step::Changed;
        }

        if has_field {
            return Step::Unchanged;
        }

        // NOT (NOT x): fold the leaf's negation into the group's.
        if node.negation.is_negated() && child_node.negation.is_explicit() {
            let negation = node.negation.merge(child_node.negation);
            trace!(node = id.index(), "double negation merged");
            ast.node_mut(child).negation = Negation::Unspecified;
            ast.node_mut(id).negation = negation;
            return Step::Changed;
        }

        if group.has_parens {
            if node.negation.is_negated() {
                trace!(node = id.index(), "parentheses dropped from negated clause");
                if let Some(group) = ast.group_mut(id) {
                    group.has_parens = false;
                }
                return Step::Changed;
            }
            if is_root {
                if let Some(group) = ast.group_mut(id) {
                    group.has_parens = false;
                }
                return Step::Changed;
            }
            if !can_hoist(ast, id, child) {
                return Step::Unchanged;
            }
            trace!(node = id.index(), "redundant parentheses removed");
            return Step::Moved(collapse_into_child(ast, id, child));
        }

        if ast.is_link_group(id) {
            trace!(node = id.index(), "single-clause link group collapsed");
            return Step::Moved(collapse_into_child(ast, id, child));
        }

        Step::Unchanged
    }
}

/// True when the group's modifiers can move onto its child without clashing.
fn can_hoist(ast: &QueryAst, group: NodeId, child: NodeId) -> bool {
    let outer = ast.node(group);
    let inner = ast.node(child);
    (outer.prefix.is_none() || inner.prefix.is_none())
        && (outer.boost.is_none() || inner.boost.is_none())
        && (outer.proximity.is_none() || inner.proximity.is_none())
}

fn collapse_into_child(ast: &mut QueryAst, id: NodeId, child: NodeId) -> NodeId {
    let outer = ast.node_mut(id);
    let prefix = outer.prefix.take();
    let boost = outer.boost.take();
    let proximity = outer.proximity.take();
    let negation = outer.negation;

    let inner = ast.node_mut(child);
    inner.prefix = inner.prefix.or(prefix);
    inner.boost = inner.boost.take().or(boost);
    inner.proximity = inner.proximity.take().or(proximity);
    inner.negation = negation.merge(inner.negation);

    ast.replace_self(id, child)
}

impl MutatingVisitor for CleanupQueryVisitor {
    fn visit_group(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        walk_children(self, ast, id, ctx)?;
        Ok(self.cleanup_group(ast, id))
    }
}

impl ChainableVisitor for CleanupQueryVisitor {
    fn name(&self) -> &'static str {
        "CleanupQueryVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.visit(ast, node, ctx)
    }
}
