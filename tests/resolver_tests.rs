#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lucene_query::ast::{ORIGINAL_FIELD, UNRESOLVED_FIELD};
    use lucene_query::visitors::{
        AliasMap, AliasResolverVisitor, FieldResolverVisitor, ResolvedAlias,
        alias::AliasResolver,
    };
    use lucene_query::*;

    // Helper functions
    fn run(query: &str, pass: impl ChainableVisitor, ctx: &mut QueryContext) -> QueryAst {
        let mut ast = parse_query(query).unwrap();
        let root = ast.root();
        pass.accept(&mut ast, root, ctx).unwrap();
        ast
    }

    fn field_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    fn nested_aliases() -> AliasMap {
        let mut child = AliasMap::new();
        child.add("nested", "other");
        let mut map = AliasMap::new();
        map.add_nested("field1", "field2", child);
        map
    }

    // ========================================================================
    // Alias Resolution
    // ========================================================================

    #[test]
    fn test_simple_alias() {
        let mut map = AliasMap::new();
        map.add("field1", "field2");
        let ast = run(
            "field1:value",
            AliasResolverVisitor::with_resolver(map),
            &mut QueryContext::new(),
        );

        assert_eq!(to_query_string(&ast), "field2:value");
        let term = ast.left(ast.root()).unwrap();
        assert_eq!(
            ast.annotations().get(&ORIGINAL_FIELD, term).map(String::as_str),
            Some("field1")
        );
    }

    #[test]
    fn test_nested_alias_path() {
        let ast = run(
            "field1.nested:value",
            AliasResolverVisitor::with_resolver(nested_aliases()),
            &mut QueryContext::new(),
        );
        assert_eq!(to_query_string(&ast), "field2.other:value");
    }

    #[test]
    fn test_alias_scoped_to_group() {
        let ast = run(
            "field1:(nested:value) nested:value",
            AliasResolverVisitor::with_resolver(nested_aliases()),
            &mut QueryContext::new(),
        );
        assert_eq!(to_query_string(&ast), "field2:(other:value) nested:value");
    }

    #[test]
    fn test_unmapped_suffix_kept() {
        let ast = run(
            "field1.unknown.deep:value",
            AliasResolverVisitor::with_resolver(nested_aliases()),
            &mut QueryContext::new(),
        );
        assert_eq!(to_query_string(&ast), "field2.unknown.deep:value");
    }

    #[test]
    fn test_unresolved_group_clears_scope() {
        let mut map = AliasMap::new();
        map.add("inner", "renamed");
        let ast = run(
            "unknown:(inner:1) inner:2",
            AliasResolverVisitor::with_resolver(map),
            &mut QueryContext::new(),
        );
        assert_eq!(to_query_string(&ast), "unknown:(inner:1) renamed:2");
    }

    #[test]
    fn test_context_alias_resolver_wins() {
        let mut pass_map = AliasMap::new();
        pass_map.add("a", "from_pass");
        let mut ctx_map = AliasMap::new();
        ctx_map.add("a", "from_context");

        let mut ctx = QueryContext::new().with_alias_resolver(ctx_map);
        let ast = run("a:1", AliasResolverVisitor::with_resolver(pass_map), &mut ctx);
        assert_eq!(to_query_string(&ast), "from_context:1");
    }

    #[test]
    fn test_callback_alias_resolver() {
        let resolver = AliasResolver::new(|field: &str| {
            field.strip_prefix("x_").map(|rest| ResolvedAlias {
                name: rest.to_uppercase(),
                resolver: None,
            })
        });
        let ast = run(
            "x_name:1 other:2",
            AliasResolverVisitor::with_resolver(resolver),
            &mut QueryContext::new(),
        );
        assert_eq!(to_query_string(&ast), "NAME:1 other:2");
    }

    #[test]
    fn test_alias_without_resolver_fails() {
        let mut ast = parse_query("a:1").unwrap();
        let root = ast.root();
        let error = AliasResolverVisitor::new()
            .accept(&mut ast, root, &mut QueryContext::new())
            .unwrap_err();
        assert!(matches!(error, QueryError::MissingResolver("alias")));
    }

    #[test]
    fn test_alias_map_from_json_rejects_numbers() {
        let json = serde_json::json!({ "a": 1 });
        assert!(matches!(AliasMap::from_json(&json), Err(QueryError::Config(_))));
    }

    // ========================================================================
    // Field Resolution
    // ========================================================================

    #[test]
    fn test_hierarchical_field_map() {
        let map = field_map(&[
            ("original", "replacement"),
            ("original.nested", "otherreplacement"),
        ]);
        let mut ctx = QueryContext::new();
        let ast = run(
            "original.nested.hey:1 original:2 notmapped:3",
            FieldResolverVisitor::with_field_map(map),
            &mut ctx,
        );

        assert_eq!(
            to_query_string(&ast),
            "otherreplacement.hey:1 replacement:2 notmapped:3"
        );
        assert!(ctx.validation().unresolved_fields.contains("notmapped"));
        assert_eq!(ctx.validation().unresolved_fields.len(), 1);
    }

    #[test]
    fn test_unresolved_field_annotated() {
        let mut ctx = QueryContext::new();
        let ast = run("unknown:1", FieldResolverVisitor::with_field_map(HashMap::new()), &mut ctx);

        let term = ast.left(ast.root()).unwrap();
        assert_eq!(ast.annotations().get(&UNRESOLVED_FIELD, term), Some(&true));
        assert_eq!(to_query_string(&ast), "unknown:1");
    }

    #[test]
    fn test_context_field_resolver_first() {
        let mut ctx = QueryContext::new().with_field_resolver(|field: &str, _: &QueryContext| {
            if field == "a" {
                Resolution::Resolved("from_context".to_string())
            } else {
                Resolution::NotFound
            }
        });
        let pass = FieldResolverVisitor::with_field_map(field_map(&[("a", "from_map"), ("b", "b_map")]));
        let ast = run("a:1 b:2", pass, &mut ctx);

        assert_eq!(to_query_string(&ast), "from_context:1 b_map:2");
        assert!(ctx.validation().unresolved_fields.is_empty());
    }

    #[test]
    fn test_failed_resolver_counts_as_unresolved() {
        let pass = FieldResolverVisitor::with_resolver(|_: &str, _: &QueryContext| {
            Resolution::Failed("timed out".to_string())
        });
        let mut ctx = QueryContext::new();
        let ast = run("a:1", pass, &mut ctx);

        assert_eq!(to_query_string(&ast), "a:1");
        assert!(ctx.validation().unresolved_fields.contains("a"));
    }

    #[test]
    fn test_resolution_from_result() {
        let ok: std::result::Result<Option<String>, String> = Ok(Some("x".to_string()));
        assert_eq!(Resolution::from(ok), Resolution::Resolved("x".to_string()));

        let failed: std::result::Result<Option<String>, String> = Err("boom".to_string());
        assert_eq!(Resolution::from(failed), Resolution::Failed("boom".to_string()));
        assert_eq!(Resolution::from(None).resolved(), None);
    }

    #[test]
    fn test_reserved_fields_skipped() {
        let mut ctx = QueryContext::new();
        run("@include:x", FieldResolverVisitor::with_field_map(HashMap::new()), &mut ctx);
        assert!(ctx.validation().unresolved_fields.is_empty());
    }

    #[test]
    fn test_group_fields_resolved() {
        let mut ctx = QueryContext::new();
        let ast = run(
            "user:(name:x)",
            FieldResolverVisitor::with_field_map(field_map(&[("user", "account"), ("name", "name")])),
            &mut ctx,
        );
        assert_eq!(to_query_string(&ast), "account:(name:x)");
    }
}
