#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use lucene_query::visitors::{
        AliasMap, AliasResolverVisitor, CleanupQueryVisitor, FieldResolverVisitor, IncludeVisitor,
        InvertQueryVisitor, RemoveFieldsVisitor, ValidationVisitor,
    };
    use lucene_query::*;

    // Helper functions
    #[derive(Clone)]
    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ChainableVisitor for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        fn accept(&self, _ast: &mut QueryAst, node: NodeId, _ctx: &mut QueryContext) -> Result<NodeId> {
            self.log.lock().unwrap().push(self.label);
            Ok(node)
        }
    }

    fn standard() -> Pipeline {
        Pipeline::builder()
            .add(ValidationVisitor::new(), 30)
            .add(CleanupQueryVisitor::new(), 10)
            .add(FieldResolverVisitor::new(), 20)
            .build()
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    #[test]
    fn test_passes_sorted_by_priority() {
        assert_eq!(
            standard().pass_names(),
            vec!["CleanupQueryVisitor", "FieldResolverVisitor", "ValidationVisitor"]
        );
    }

    #[test]
    fn test_equal_priorities_keep_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .add(Recorder { label: "first", log: log.clone() }, 5)
            .add(Recorder { label: "second", log: log.clone() }, 5)
            .add(Recorder { label: "early", log: log.clone() }, 1)
            .build();

        let mut ast = parse_query("a").unwrap();
        pipeline.run(&mut ast, &mut QueryContext::new()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["early", "first", "second"]);
    }

    #[test]
    fn test_add_before_and_after() {
        let pipeline = standard()
            .to_builder()
            .add_before::<FieldResolverVisitor, _>(InvertQueryVisitor::default())
            .unwrap()
            .add_after::<FieldResolverVisitor, _>(RemoveFieldsVisitor::new(["x"]))
            .unwrap()
            .build();

        assert_eq!(
            pipeline.pass_names(),
            vec![
                "CleanupQueryVisitor",
                "InvertQueryVisitor",
                "FieldResolverVisitor",
                "RemoveFieldsVisitor",
                "ValidationVisitor",
            ]
        );
    }

    #[test]
    fn test_replace_defaults_to_just_before() {
        let pipeline = standard()
            .to_builder()
            .replace::<FieldResolverVisitor, _>(AliasResolverVisitor::new(), None)
            .unwrap()
            .build();

        assert_eq!(
            pipeline.pass_names(),
            vec!["CleanupQueryVisitor", "AliasResolverVisitor", "ValidationVisitor"]
        );
    }

    #[test]
    fn test_replace_with_priority() {
        let pipeline = standard()
            .to_builder()
            .replace::<FieldResolverVisitor, _>(AliasResolverVisitor::new(), Some(100))
            .unwrap()
            .build();
        assert_eq!(pipeline.pass_names().last(), Some(&"AliasResolverVisitor"));
    }

    #[test]
    fn test_remove() {
        let builder = standard().to_builder().remove::<CleanupQueryVisitor>();
        assert!(!builder.contains::<CleanupQueryVisitor>());
        assert!(builder.contains::<ValidationVisitor>());
        assert_eq!(builder.build().len(), 2);
    }

    #[test]
    fn test_unknown_anchor() {
        let builder = Pipeline::builder().add(CleanupQueryVisitor::new(), 0);
        let result = builder.add_before::<ValidationVisitor, _>(IncludeVisitor::new());
        assert!(matches!(result, Err(QueryError::PassNotFound(_))));

        let builder = Pipeline::builder();
        let result = builder.replace::<ValidationVisitor, _>(IncludeVisitor::new(), None);
        assert!(matches!(result, Err(QueryError::PassNotFound(_))));
    }

    #[test]
    fn test_built_pipeline_is_immutable() {
        let original = standard();
        let extended = original.to_builder().add(IncludeVisitor::new(), 0).build();

        assert_eq!(original.len(), 3);
        assert_eq!(extended.len(), 4);
        assert!(Pipeline::default().is_empty());
    }

    // ========================================================================
    // Running
    // ========================================================================

    #[test]
    fn test_error_stops_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .add(InvertQueryVisitor::default(), 0)
            .add(Recorder { label: "after", log: log.clone() }, 10)
            .build();

        let mut ast = parse_query("a").unwrap();
        let mut ctx = QueryContext::new().with_default_operator(Operator::Or);
        let error = pipeline.run(&mut ast, &mut ctx).unwrap_err();

        assert!(matches!(error, QueryError::InvalidOperation(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_full_pipeline() {
        let mut aliases = AliasMap::new();
        aliases.add("user", "account");
        let field_map = HashMap::from([
            ("account".to_string(), "account_id".to_string()),
            ("created".to_string(), "created_at".to_string()),
        ]);
        let includes = HashMap::from([("recent".to_string(), "created:>2020".to_string())]);

        let pipeline = Pipeline::builder()
            .add(ValidationVisitor::new(), 100)
            .add(FieldResolverVisitor::with_field_map(field_map), 20)
            .add(AliasResolverVisitor::with_resolver(aliases), 10)
            .add(
                IncludeVisitor::new()
                    .with_resolver(move |name: &str| Resolution::from(includes.get(name).cloned())),
                0,
            )
            .build();

        let mut ast = parse_query("@include:recent AND user:bob").unwrap();
        let mut ctx = QueryContext::new();
        pipeline.run(&mut ast, &mut ctx).unwrap();

        assert_eq!(to_query_string(&ast), "(created_at:>2020) AND account_id:bob");
        let result = ctx.take_validation();
        assert!(result.is_valid);
        assert!(result.referenced_includes.contains("recent"));
        assert!(result.referenced_fields.contains("account_id"));
        assert!(result.referenced_fields.contains("created_at"));
    }

    #[test]
    fn test_shared_between_threads() {
        let pipeline = Pipeline::builder()
            .add(RemoveFieldsVisitor::new(["secret"]), 0)
            .add(CleanupQueryVisitor::new(), 10)
            .build();

        let outputs: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let pipeline = &pipeline;
                    scope.spawn(move || {
                        let mut ast = parse_query(&format!("a:{i} secret:{i}")).unwrap();
                        pipeline.run(&mut ast, &mut QueryContext::new()).unwrap();
                        to_query_string(&ast)
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(outputs, vec!["a:0", "a:1", "a:2", "a:3"]);
    }
}
