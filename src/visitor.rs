//! Visitor contracts over [`QueryAst`].
//!
//! - [`QueryVisitor`] - read-only depth-first walk producing an external result
//! - [`MutatingVisitor`] - per-variant handlers that may replace or remove the
//!   node they are given
//! - [`ChainableVisitor`] - the unit a [`Pipeline`](crate::Pipeline) runs
//!
//! Dispatch is a `match` on [`NodeKind`], so every visitor handles every
//! variant (usually by inheriting the default).

use crate::{
    ast::{GroupNode, NodeId, NodeKind, QueryAst, RangeNode, TermNode},
    context::QueryContext,
    error::Result,
};

/// Read-only visitor.
///
/// `enter_group` runs before the group's children and decides whether they
/// are visited at all; `leave_group` runs after them.
pub trait QueryVisitor {
    type Output;

    fn enter_group(&mut self, _ast: &QueryAst, _id: NodeId, _group: &GroupNode) -> bool {
        true
    }

    fn leave_group(&mut self, _ast: &QueryAst, _id: NodeId, _group: &GroupNode) {}

    fn visit_term(&mut self, _ast: &QueryAst, _id: NodeId, _term: &TermNode) {}

    fn visit_range(&mut self, _ast: &QueryAst, _id: NodeId, _range: &RangeNode) {}

    fn visit_exists(&mut self, _ast: &QueryAst, _id: NodeId) {}

    fn visit_missing(&mut self, _ast: &QueryAst, _id: NodeId) {}

    fn finish(self) -> Self::Output;

    /// Walks the subtree at `id` and returns the visitor's result.
    fn run(mut self, ast: &QueryAst, id: NodeId) -> Self::Output
    where
        Self: Sized,
    {
        walk(&mut self, ast, id);
        self.finish()
    }
}

/// Depth-first walk used by [`QueryVisitor::run`].
pub fn walk<V: QueryVisitor + ?Sized>(visitor: &mut V, ast: &QueryAst, id: NodeId) {
    match &ast.node(id).kind {
        NodeKind::Group(group) => {
            if visitor.enter_group(ast, id, group) {
                for child in ast.children(id) {
                    walk(visitor, ast, child);
                }
            }
            visitor.leave_group(ast, id, group);
        }
        NodeKind::Term(term) => visitor.visit_term(ast, id, term),
        NodeKind::Range(range) => visitor.visit_range(ast, id, range),
        NodeKind::Exists => visitor.visit_exists(ast, id),
        NodeKind::Missing => visitor.visit_missing(ast, id),
    }
}

/// A pass that can be chained in a pipeline.
///
/// `accept` receives the node to start from and returns the node that now
/// stands in its place, which differs from the input when the pass replaced
/// it.
pub trait ChainableVisitor: Send + Sync {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId>;
}

/// Rewriting visitor with one handler per variant.
///
/// Each handler returns the node now occupying the visited position. A
/// handler that removes its node returns the former parent instead.
pub trait MutatingVisitor {
    fn visit_group(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        walk_children(self, ast, id, ctx)?;
        Ok(id)
    }

    fn visit_term(&self, _ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(id)
    }

    fn visit_range(&self, _ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(id)
    }

    fn visit_exists(&self, _ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(id)
    }

    fn visit_missing(&self, _ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(id)
    }

    fn visit(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        match ast.node(id).kind {
            NodeKind::Group(_) => self.visit_group(ast, id, ctx),
            NodeKind::Term(_) => self.visit_term(ast, id, ctx),
            NodeKind::Range(_) => self.visit_range(ast, id, ctx),
            NodeKind::Exists => self.visit_exists(ast, id, ctx),
            NodeKind::Missing => self.visit_missing(ast, id, ctx),
        }
    }
}

/// Visits the left then the right slot of a group.
///
/// Slots are re-read after each visit, so a child that replaced or removed
/// itself does not confuse the walk.
pub fn walk_children<V: MutatingVisitor + ?Sized>(
    visitor: &V,
    ast: &mut QueryAst,
    id: NodeId,
    ctx: &mut QueryContext,
) -> Result<()> {
    if let Some(left) = ast.left(id) {
        visitor.visit(ast, left, ctx)?;
    }
    if let Some(right) = ast.right(id) {
        visitor.visit(ast, right, ctx)?;
    }
    Ok(())
}
