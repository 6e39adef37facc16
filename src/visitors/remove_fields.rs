use std::{collections::HashSet, sync::Arc};

use tracing::trace;

use crate::{
    ast::{NodeId, QueryAst},
    context::QueryContext,
    error::Result,
    visitor::{ChainableVisitor, MutatingVisitor, walk_children},
};

/// Drops every node whose field matches, group or leaf.
///
/// Leaves empty groups behind; run [`CleanupQueryVisitor`] afterwards.
///
/// [`CleanupQueryVisitor`]: crate::visitors::CleanupQueryVisitor
#[derive(Clone)]
pub struct RemoveFieldsVisitor {
    matches: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl RemoveFieldsVisitor {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: HashSet<String> = fields.into_iter().map(Into::into).collect();
        Self::with_predicate(move |field| fields.contains(field))
    }

    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        RemoveFieldsVisitor {
            matches: Arc::new(predicate),
        }
    }

    fn is_removed(&self, ast: &QueryAst, id: NodeId) -> bool {
        ast.node(id).field_name().is_some_and(|field| (self.matches)(field))
    }

    fn remove(&self, ast: &mut QueryAst, id: NodeId) -> NodeId {
        trace!(node = id.index(), field = ?ast.node(id).field, "field removed");
        match ast.remove_self(id) {
            Some(parent) => parent,
            None => {
                // The root stays; empty it instead.
                ast.set_left(id, None);
                ast.set_right(id, None);
                ast.node_mut(id).field = None;
                id
            }
        }
    }
}

impl MutatingVisitor for RemoveFieldsVisitor {
    fn visit_group(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        if self.is_removed(ast, id) {
            return Ok(self.remove(ast, id));
        }
        walk_children(self, ast, id, ctx)?;
        Ok(id)
    }

    fn visit_term(&self, ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(self.leaf(ast, id))
    }

    fn visit_range(&self, ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(self.leaf(ast, id))
    }

    fn visit_exists(&self, ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(self.leaf(ast, id))
    }

    fn visit_missing(&self, ast: &mut QueryAst, id: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(self.leaf(ast, id))
    }
}

impl RemoveFieldsVisitor {
    fn leaf(&self, ast: &mut QueryAst, id: NodeId) -> NodeId {
        if self.is_removed(ast, id) {
            self.remove(ast, id)
        } else {
            id
        }
    }
}

impl ChainableVisitor for RemoveFieldsVisitor {
    fn name(&self) -> &'static str {
        "RemoveFieldsVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.visit(ast, node, ctx)
    }
}
