use std::{collections::HashMap, sync::Arc};

use tracing::{trace, warn};

use crate::{
    ast::{NodeId, ORIGINAL_FIELD, QueryAst, UNRESOLVED_FIELD},
    context::{FieldResolver, QueryContext, Resolution},
    error::Result,
    visitor::{ChainableVisitor, MutatingVisitor, walk_children},
};

/// Maps every field through the context resolver, then the pass's own.
///
/// The first resolver that answers wins. Fields nobody resolves are left as
/// they are, flagged with [`UNRESOLVED_FIELD`] and added to the context's
/// `unresolved_fields` for validation to judge. Reserved `@` fields are
/// skipped.
#[derive(Clone, Default)]
pub struct FieldResolverVisitor {
    resolver: Option<FieldResolver>,
}

impl FieldResolverVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn(&str, &QueryContext) -> Resolution + Send + Sync + 'static,
    {
        FieldResolverVisitor {
            resolver: Some(Arc::new(resolver)),
        }
    }

    pub fn from_resolver(resolver: FieldResolver) -> Self {
        FieldResolverVisitor {
            resolver: Some(resolver),
        }
    }

    /// Resolver backed by a flat dotted map, see [`resolve_hierarchical`].
    pub fn with_field_map(map: HashMap<String, String>) -> Self {
        FieldResolverVisitor {
            resolver: Some(hierarchical_resolver(map)),
        }
    }

    fn resolve_field(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) {
        let Some(field) = ast.node(id).field_name().map(str::to_string) else {
            return;
        };
        if field.starts_with('@') {
            return;
        }

        let mut resolved = None;
        for resolver in [ctx.field_resolver(), self.resolver.as_ref()].into_iter().flatten() {
            match resolver(&field, ctx) {
                Resolution::Resolved(name) => {
                    resolved = Some(name);
                    break;
                }
                Resolution::NotFound => {}
                Resolution::Failed(reason) => {
                    warn!(field = %field, %reason, "field resolver failed");
                }
            }
        }

        match resolved {
            Some(name) if name != field => {
                trace!(from = %field, to = %name, "field resolved");
                ast.annotations_mut()
                    .set_if_absent(&ORIGINAL_FIELD, id, field);
                ast.node_mut(id).field = Some(name);
            }
            Some(_) => {}
            None => {
                ast.annotations_mut().set(&UNRESOLVED_FIELD, id, true);
                ctx.validation_mut().unresolved_fields.insert(field);
            }
        }
    }
}

impl MutatingVisitor for FieldResolverVisitor {
    fn visit_group(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.resolve_field(ast, id, ctx);
        walk_children(self, ast, id, ctx)?;
        Ok(id)
    }

    fn visit_term(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.resolve_field(ast, id, ctx);
        Ok(id)
    }

    fn visit_range(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.resolve_field(ast, id, ctx);
        Ok(id)
    }

    fn visit_exists(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.resolve_field(ast, id, ctx);
        Ok(id)
    }

    fn visit_missing(&self, ast: &mut QueryAst, id: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.resolve_field(ast, id, ctx);
        Ok(id)
    }
}

impl ChainableVisitor for FieldResolverVisitor {
    fn name(&self) -> &'static str {
        "FieldResolverVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        self.visit(ast, node, ctx)
    }
}

/// Looks a dotted field up in a flat map, falling back to the longest mapped
/// prefix and re-appending the rest.
///
/// ```
/// use std::collections::HashMap;
/// use lucene_query::visitors::field_resolver::resolve_hierarchical;
///
/// let map = HashMap::from([
///     ("original".to_string(), "replacement".to_string()),
///     ("original.nested".to_string(), "otherreplacement".to_string()),
/// ]);
/// assert_eq!(resolve_hierarchical(&map, "original.nested.hey").as_deref(), Some("otherreplacement.hey"));
/// assert_eq!(resolve_hierarchical(&map, "original.other").as_deref(), Some("replacement.other"));
/// assert_eq!(resolve_hierarchical(&map, "notmapped"), None);
/// ```
pub fn resolve_hierarchical(map: &HashMap<String, String>, field: &str) -> Option<String> {
    if let Some(resolved) = map.get(field) {
        return Some(resolved.clone());
    }

    let mut end = field.len();
    while let Some(index) = field[..end].rfind('.') {
        if let Some(resolved) = map.get(&field[..index]) {
            return Some(format!("{resolved}{}", &field[index..]));
        }
        end = index;
    }
    None
}

/// Wraps a flat dotted map as a [`FieldResolver`].
pub fn hierarchical_resolver(map: HashMap<String, String>) -> FieldResolver {
    Arc::new(move |field: &str, _: &QueryContext| -> Resolution {
        resolve_hierarchical(&map, field).into()
    })
}
