use tracing::trace;

use crate::{
    ast::{NodeId, OPERATION_TYPE, QueryAst},
    context::QueryContext,
    error::Result,
    visitor::{ChainableVisitor, MutatingVisitor, walk_children},
};

/// Normalizes aggregation/sort shorthand into `(field, operation type)`.
///
/// ```text
/// terms:(status @missing:none)   group { field: status,   @OperationType: terms }
/// min:price                      term  { field: price,    @OperationType: min }
/// count                          term  { field: "",       @OperationType: count }
/// ```
///
/// Nodes that do not name a field are reported through the validation result
/// and left in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignOperationTypeVisitor;

impl AssignOperationTypeVisitor {
    pub fn new() -> Self {
        AssignOperationTypeVisitor
    }
}

fn is_reserved(field: &str) -> bool {
    field.starts_with('@')
}

impl MutatingVisitor for AssignOperationTypeVisitor {
    fn visit_group(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        let operation = ast
            .node(id)
            .field_name()
            .filter(|field| !is_reserved(field))
            .map(str::to_string);

        if let Some(operation) = operation {
            let left = ast.left(id);
            let field = left.and_then(|left| {
                ast.term(left)
                    .map(|term| term.unescaped_term.clone())
                    .filter(|term| !term.is_empty())
                    .map(|term| (left, term))
            });

            match field {
                Some((left, field)) => {
                    trace!(%operation, %field, "operation assigned to group");
                    let term_node = ast.node_mut(left);
                    let boost = term_node.boost.take();
                    let proximity = term_node.proximity.take();

                    let group = ast.node_mut(id);
                    group.field = Some(field);
                    if boost.is_some() {
                        group.boost = boost;
                    }
                    if proximity.is_some() {
                        group.proximity = proximity;
                    }
                    ast.set_left(id, None);
                }
                None => {
                    ctx.validation_mut()
                        .add_error(format!("{operation} must specify a field"));
                }
            }
            ast.annotations_mut().set(&OPERATION_TYPE, id, operation);
        }

        walk_children(self, ast, id, ctx)?;
        Ok(id)
    }

    fn visit_term(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        let node = ast.node(id);
        let Some(term) = node.as_term().map(|term| term.unescaped_term.clone()) else {
            return Ok(id);
        };

        match node.field_name().map(str::to_string) {
            Some(field) if is_reserved(&field) => {}
            Some(operation) if !term.is_empty() => {
                trace!(%operation, field = %term, "operation assigned to term");
                ast.node_mut(id).field = Some(term);
                ast.annotations_mut().set(&OPERATION_TYPE, id, operation);
            }
            Some(operation) => {
                ctx.validation_mut()
                    .add_error(format!("{operation} must specify a field"));
                ast.annotations_mut().set(&OPERATION_TYPE, id, operation);
            }
            None if !term.is_empty() => {
                trace!(operation = %term, "operation assigned to bare term");
                ast.node_mut(id).field = Some(String::new());
                ast.annotations_mut().set(&OPERATION_TYPE, id, term);
            }
            None => {
                ctx.validation_mut().add_error("must specify a field".to_string());
            }
        }
        Ok(id)
    }
}

impl ChainableVisitor for AssignOperationTypeVisitor {
    fn name(&self) -> &'static str {
        "AssignOperationTypeVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.visit(ast, node, ctx)
    }
}
