//! Scoped field aliasing.
//!
//! An [`AliasMap`] maps names to replacements, each optionally carrying a child
//! map that applies to the path segments (and the sub-query) below it:
//!
//! ```text
//! { "user": { "name": "account", "fields": { "mail": "email_address" } } }
//!
//! user.mail:x          ->  account.email_address:x
//! user:(mail:x)        ->  account:(email_address:x)
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::trace;

use crate::{
    ast::{NodeId, ORIGINAL_FIELD, QueryAst},
    context::QueryContext,
    error::{QueryError, Result},
    visitor::ChainableVisitor,
};

/// A resolved alias and the resolver scoped below it.
#[derive(Clone)]
pub struct ResolvedAlias {
    pub name: String,
    pub resolver: Option<AliasResolver>,
}

/// `field -> Option<(name, child resolver)>`
#[derive(Clone)]
pub struct AliasResolver(Arc<dyn Fn(&str) -> Option<ResolvedAlias> + Send + Sync>);

impl AliasResolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&str) -> Option<ResolvedAlias> + Send + Sync + 'static,
    {
        AliasResolver(Arc::new(resolve))
    }

    /// A resolver that knows no aliases.
    pub fn empty() -> Self {
        AliasResolver::new(|_| None)
    }

    pub fn resolve(&self, field: &str) -> Option<ResolvedAlias> {
        (self.0)(field)
    }
}

impl fmt::Debug for AliasResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AliasResolver")
    }
}

impl From<AliasMap> for AliasResolver {
    fn from(map: AliasMap) -> Self {
        Arc::new(map).into()
    }
}

impl From<Arc<AliasMap>> for AliasResolver {
    fn from(map: Arc<AliasMap>) -> Self {
        AliasResolver::new(move |field| map.resolve(field))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub name: String,
    pub child: Option<Arc<AliasMap>>,
}

/// Nested rename table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasMap {
    entries: HashMap<String, AliasEntry>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, alias: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.entries.insert(
            alias.into(),
            AliasEntry {
                name: name.into(),
                child: None,
            },
        );
        self
    }

    pub fn add_nested(
        &mut self,
        alias: impl Into<String>,
        name: impl Into<String>,
        child: AliasMap,
    ) -> &mut Self {
        self.entries.insert(
            alias.into(),
            AliasEntry {
                name: name.into(),
                child: Some(Arc::new(child)),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a map from JSON.
    ///
    /// Values are either a replacement name or an object with `name` and an
    /// optional nested `fields` map:
    ///
    /// ```
    /// use lucene_query::visitors::alias::AliasMap;
    ///
    /// let json = serde_json::json!({
    ///     "field1": { "name": "field2", "fields": { "nested": "other" } },
    ///     "a": "b"
    /// });
    /// let map = AliasMap::from_json(&json).unwrap();
    /// assert_eq!(map.resolve("field1.nested").unwrap().name, "field2.other");
    /// assert_eq!(map.resolve("a").unwrap().name, "b");
    /// ```
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| QueryError::Config("alias map must be a JSON object".to_string()))?;

        let mut map = AliasMap::new();
        for (alias, value) in object {
            match value {
                serde_json::Value::String(name) => {
                    map.add(alias.clone(), name.clone());
                }
                serde_json::Value::Object(entry) => {
                    let name = entry
                        .get("name")
                        .and_then(|name| name.as_str())
                        .unwrap_or(alias)
                        .to_string();
                    match entry.get("fields") {
                        Some(fields) => {
                            map.add_nested(alias.clone(), name, AliasMap::from_json(fields)?);
                        }
                        None => {
                            map.add(alias.clone(), name);
                        }
                    }
                }
                other => {
                    return Err(QueryError::Config(format!(
                        "alias \"{alias}\" must map to a string or an object, got {other}"
                    )));
                }
            }
        }
        Ok(map)
    }

    /// Resolves a dotted path.
    ///
    /// The longest registered prefix wins; whatever follows it is resolved
    /// against that entry's child map, and any part nothing maps is kept
    /// verbatim.
    pub fn resolve(&self, field: &str) -> Option<ResolvedAlias> {
        let mut prefix = field;
        loop {
            if let Some(entry) = self.entries.get(prefix) {
                let rest = &field[prefix.len()..];
                let Some(rest) = rest.strip_prefix('.') else {
                    return Some(ResolvedAlias {
                        name: entry.name.clone(),
                        resolver: entry.child.clone().map(AliasResolver::from),
                    });
                };

                let nested = entry.child.as_ref().and_then(|child| child.resolve(rest));
                return Some(match nested {
                    Some(nested) => ResolvedAlias {
                        name: format!("{}.{}", entry.name, nested.name),
                        resolver: nested.resolver,
                    },
                    None => ResolvedAlias {
                        name: format!("{}.{}", entry.name, rest),
                        resolver: None,
                    },
                });
            }

            match prefix.rfind('.') {
                Some(index) => prefix = &prefix[..index],
                None => return None,
            }
        }
    }
}

/// Renames fields through an [`AliasResolver`], scoping child maps to the
/// groups whose field they belong to.
///
/// The resolver set on the context wins over the one given at construction;
/// with neither, the pass fails.
#[derive(Debug, Clone, Default)]
pub struct AliasResolverVisitor {
    resolver: Option<AliasResolver>,
}

impl AliasResolverVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(resolver: impl Into<AliasResolver>) -> Self {
        AliasResolverVisitor {
            resolver: Some(resolver.into()),
        }
    }

    fn resolve_scope(&self, ast: &mut QueryAst, id: NodeId, resolver: &AliasResolver) {
        let resolved = match ast.node(id).field_name() {
            Some(field) => resolver
                .resolve(field)
                .map(|alias| (field.to_string(), alias)),
            None => None,
        };
        let has_field = ast.node(id).field_name().is_some();

        let scope = match resolved {
            Some((original, alias)) => {
                if alias.name != original {
                    trace!(from = %original, to = %alias.name, "alias resolved");
                    ast.annotations_mut()
                        .set_if_absent(&ORIGINAL_FIELD, id, original);
                    ast.node_mut(id).field = Some(alias.name);
                }
                alias.resolver.unwrap_or_else(AliasResolver::empty)
            }
            None if has_field => AliasResolver::empty(),
            None => resolver.clone(),
        };

        let children: Vec<NodeId> = ast.children(id).collect();
        for child in children {
            self.resolve_scope(ast, child, &scope);
        }
    }
}

impl ChainableVisitor for AliasResolverVisitor {
    fn name(&self) -> &'static str {
        "AliasResolverVisitor"
    }

    fn accept(&self, ast: &mut QueryAst, node: NodeId, ctx: &mut QueryContext) -> Result<NodeId> {
        let resolver = ctx
            .alias_resolver()
            .or(self.resolver.as_ref())
            .cloned()
            .ok_or(QueryError::MissingResolver("alias"))?;
        self.resolve_scope(ast, node, &resolver);
        Ok(node)
    }
}
