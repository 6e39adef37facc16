use std::sync::Arc;

use tracing::{trace, warn};

use crate::{
    ast::{INCLUDE_NAME, NodeId, QueryAst},
    context::{IncludeResolver, QueryContext, Resolution},
    error::Result,
    parser::{LuceneQueryParser, QueryParser},
    visitor::ChainableVisitor,
};

/// Reserved field marking an include term: `@include:name`.
pub const INCLUDE_FIELD: &str = "@include";

type SkipInclude = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Splices named query fragments in place of `@include:name` terms.
///
/// Fragments are fetched through the context's include resolver, then the
/// pass's own, parsed with the pass's [`QueryParser`], and expanded
/// recursively. The spliced group is parenthesized and takes over the include
/// term's negation, prefix and boost, so `-@include:spam` excludes the whole
/// fragment.
///
/// Problems never abort the pass:
/// - a name no resolver knows (or whose resolver failed) lands in
///   `unresolved_includes`
/// - a fragment that does not parse is a validation error
/// - an include reached again through its own expansion is a validation
///   error naming the chain
#[derive(Clone)]
pub struct IncludeVisitor {
    parser: Arc<dyn QueryParser>,
    resolver: Option<IncludeResolver>,
    skip_include: Option<SkipInclude>,
}

impl Default for IncludeVisitor {
    fn default() -> Self {
        IncludeVisitor {
            parser: Arc::new(LuceneQueryParser),
            resolver: None,
            skip_include: None,
        }
    }
}

impl IncludeVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str) -> Resolution + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_parser(mut self, parser: impl QueryParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Leaves includes for which `skip` returns true untouched.
    pub fn with_skip_include<F>(mut self, skip: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.skip_include = Some(Arc::new(skip));
        self
    }

    fn resolve(&self, name: &str, ctx: &QueryContext) -> Option<String> {
        for resolver in [ctx.include_resolver(), self.resolver.as_ref()].into_iter().flatten() {
            match resolver(name) {
                Resolution::Resolved(query) => return Some(query),
                Resolution::NotFound => {}
                Resolution::Failed(reason) => {
                    warn!(include = name, %reason, "include resolver failed");
                }
            }
        }
        None
    }

    fn expand(
        &self,
        ast: &mut QueryAst,
        id: NodeId,
        ctx: &mut QueryContext,
        chain: &mut Vec<String>,
    ) -> NodeId {
        if ast.node(id).is_group() {
            for child in ast.children(id) {
                self.expand(ast, child, ctx, chain);
            }
            return id;
        }

        let node = ast.node(id);
        let is_include = node
            .field
            .as_deref()
            .is_some_and(|field| field.eq_ignore_ascii_case(INCLUDE_FIELD));
        let Some(name) = node.as_term().filter(|_| is_include).map(|term| term.unescaped_term.clone())
        else {
            return id;
        };

        ctx.validation_mut().referenced_includes.insert(name.clone());
        if self.skip_include.as_ref().is_some_and(|skip| skip(&name)) {
            return id;
        }

        if chain.contains(&name) {
            let path = chain
                .iter()
                .map(String::as_str)
                .chain([name.as_str()])
                .collect::<Vec<_>>()
                .join(" -> ");
            warn!(include = %name, %path, "recursive include");
            ctx.validation_mut()
                .add_error(format!("Recursive include detected: {path}"));
            return id;
        }

        let Some(query) = self.resolve(&name, ctx) else {
            ctx.validation_mut().unresolved_includes.insert(name);
            return id;
        };

        let fragment = match self.parser.parse(&query) {
            Ok(fragment) => fragment,
            Err(error) => {
                ctx.validation_mut()
                    .add_error(format!("Unable to parse include {name}: {error}"));
                return id;
            }
        };

        let spliced = ast.import(&fragment, fragment.root());
        let term = ast.node(id).clone();
        let group = ast.node_mut(spliced);
        group.negation = term.negation;
        group.prefix = term.prefix;
        group.boost = term.boost;
        if let Some(group) = group.as_group_mut() {
            group.has_parens = true;
        }
        ast.annotations_mut().set(&INCLUDE_NAME, spliced, name.clone());
        ast.replace_self(id, spliced);
        trace!(include = %name, "include expanded");

        chain.push(name);
        self.expand(ast, spliced, ctx, chain);
        chain.pop();
        spliced
    }
}

impl ChainableVisitor for IncludeVisitor {
    fn name(&self) -> &'static str {
        "IncludeVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        Ok(self.expand(ast, node, ctx, &mut Vec::new()))
    }
}
