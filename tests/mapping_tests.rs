#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lucene_query::visitors::FieldResolverVisitor;
    use lucene_query::*;

    // Helper functions
    fn cache() -> Arc<FieldMetadataCache> {
        let cache = FieldMetadataCache::new();
        cache.set(FieldMetadata::new("CreatedAt", FieldType::Date));
        cache.set(FieldMetadata::new("Address", FieldType::Object));
        cache.set(FieldMetadata::new("name", FieldType::Keyword));
        Arc::new(cache)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    #[test]
    fn test_get_is_case_insensitive() {
        let cache = cache();
        let metadata = cache.get("createdat").unwrap();

        assert_eq!(metadata.name, "CreatedAt");
        assert_eq!(metadata.field_type, FieldType::Date);
        assert!(cache.get("updatedAt").is_none());
    }

    #[test]
    fn test_resolve_exact_match() {
        assert_eq!(cache().resolve("CREATEDAT").as_deref(), Some("CreatedAt"));
    }

    #[test]
    fn test_resolve_through_object_prefix() {
        let cache = cache();
        assert_eq!(cache.resolve("address.City").as_deref(), Some("Address.City"));
        assert_eq!(cache.resolve("address.geo.lat").as_deref(), Some("Address.geo.lat"));
    }

    #[test]
    fn test_object_prefix_with_non_ascii_name() {
        // 'İ' lowercases to a longer byte sequence
        let cache = FieldMetadataCache::new();
        cache.set(FieldMetadata::new("İnfo", FieldType::Object));

        assert_eq!(cache.resolve("İnfo.Sub").as_deref(), Some("İnfo.Sub"));
        assert_eq!(cache.resolve("İNFO.a.b").as_deref(), Some("İnfo.a.b"));
    }

    #[test]
    fn test_keyword_has_no_subfields() {
        assert_eq!(cache().resolve("name.raw"), None);
        assert!(!FieldType::Keyword.has_properties());
        assert!(FieldType::Nested.has_properties());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = cache();
        assert_eq!(cache.len(), 3);

        assert!(cache.remove("NAME").is_some());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_field_type_json() {
        assert_eq!(serde_json::to_string(&FieldType::GeoPoint).unwrap(), "\"geo_point\"");
        let metadata: FieldMetadata =
            serde_json::from_str(r#"{ "name": "tags", "field_type": "keyword" }"#).unwrap();
        assert_eq!(metadata, FieldMetadata::new("tags", FieldType::Keyword));
    }

    // ========================================================================
    // Resolver
    // ========================================================================

    #[test]
    fn test_cache_as_field_resolver() {
        let cache = cache();
        let mut ast = parse_query("createdat:>2020 address.zip:1 unknown:2").unwrap();
        let mut ctx = QueryContext::new();
        let root = ast.root();
        FieldResolverVisitor::from_resolver(cache.resolver())
            .accept(&mut ast, root, &mut ctx)
            .unwrap();

        assert_eq!(
            to_query_string(&ast),
            "CreatedAt:>2020 Address.zip:1 unknown:2"
        );
        assert_eq!(ctx.validation().unresolved_fields.len(), 1);
    }

    #[test]
    fn test_resolver_sees_later_updates() {
        let cache = cache();
        let resolver = cache.resolver();
        let ctx = QueryContext::new();

        assert_eq!(resolver("status", &ctx), Resolution::NotFound);
        cache.set(FieldMetadata::new("Status", FieldType::Keyword));
        assert_eq!(resolver("status", &ctx), Resolution::Resolved("Status".to_string()));
    }

    // ========================================================================
    // Concurrency
    // ========================================================================

    #[test]
    fn test_concurrent_writers_and_readers() {
        let cache = Arc::new(FieldMetadataCache::new());

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for field in 0..50 {
                        cache.set(FieldMetadata::new(
                            format!("Field_{writer}_{field}"),
                            FieldType::Text,
                        ));
                    }
                });
            }
            for _ in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for field in 0..50 {
                        let _ = cache.resolve(&format!("field_0_{field}"));
                    }
                });
            }
        });

        assert_eq!(cache.len(), 200);
        assert_eq!(cache.resolve("FIELD_3_49").as_deref(), Some("Field_3_49"));
    }
}
