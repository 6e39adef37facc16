#[cfg(test)]
mod tests {
    use lucene_query::ast::{NodeKind, Operator, Prefix};
    use lucene_query::*;

    // Helper functions
    fn round_trip(query: &str) -> String {
        to_query_string(&parse_query(query).unwrap())
    }

    fn first_clause(ast: &QueryAst) -> &QueryNode {
        let left = ast.left(ast.root()).unwrap();
        ast.node(left)
    }

    // ========================================================================
    // Round Trips
    // ========================================================================

    #[test]
    fn test_round_trip_simple_terms() {
        assert_eq!(round_trip("value"), "value");
        assert_eq!(round_trip("a b c"), "a b c");
        assert_eq!(round_trip("field:value"), "field:value");
    }

    #[test]
    fn test_round_trip_operators() {
        assert_eq!(round_trip("a AND b OR c"), "a AND b OR c");
        assert_eq!(round_trip("a && b || c"), "a AND b OR c");
        assert_eq!(round_trip("!a"), "NOT a");
        assert_eq!(round_trip("a AND NOT b"), "a AND NOT b");
    }

    #[test]
    fn test_round_trip_groups() {
        assert_eq!(round_trip("status:(open OR pending)"), "status:(open OR pending)");
        assert_eq!(round_trip("x AND (a OR b)"), "x AND (a OR b)");
        assert_eq!(round_trip("nested:(stuff:33)"), "nested:(stuff:33)");
    }

    #[test]
    fn test_round_trip_modifiers() {
        assert_eq!(round_trip("title:\"quick fox\"~2^1.5"), "title:\"quick fox\"~2^1.5");
        assert_eq!(round_trip("+must -mustnot"), "+must -mustnot");
        assert_eq!(round_trip("roam~"), "roam~");
        assert_eq!(round_trip("(a b)^2"), "(a b)^2");
    }

    #[test]
    fn test_round_trip_ranges() {
        assert_eq!(round_trip("price:[10 TO 20]"), "price:[10 TO 20]");
        assert_eq!(round_trip("price:{10 TO *]"), "price:{10 TO *]");
        assert_eq!(round_trip("date:>=2020-01-01"), "date:>=2020-01-01");
        assert_eq!(round_trip("age:<18"), "age:<18");
    }

    #[test]
    fn test_round_trip_special_terms() {
        assert_eq!(round_trip("_exists_:title"), "_exists_:title");
        assert_eq!(round_trip("NOT _missing_:title"), "NOT _missing_:title");
        assert_eq!(round_trip("name:/joh?n/"), "name:/joh?n/");
        assert_eq!(round_trip(r"a\:b"), r"a\:b");
    }

    #[test]
    fn test_whitespace_is_normalized() {
        assert_eq!(round_trip("  a    b\tc  "), "a b c");
    }

    // ========================================================================
    // Structure
    // ========================================================================

    #[test]
    fn test_sequence_is_right_leaning_chain() {
        let ast = parse_query("a b c").unwrap();
        let root = ast.root();

        let right = ast.right(root).unwrap();
        assert!(ast.node(right).is_group());
        assert!(!ast.group(right).unwrap().has_parens);
        assert_eq!(ast.sequence(root).count(), 3);
    }

    #[test]
    fn test_operator_stored_on_joining_group() {
        let ast = parse_query("a AND b OR c").unwrap();
        let root = ast.root();
        assert_eq!(ast.group(root).unwrap().operator, Operator::And);

        let link = ast.right(root).unwrap();
        assert_eq!(ast.group(link).unwrap().operator, Operator::Or);
    }

    #[test]
    fn test_root_has_no_parens() {
        let ast = parse_query("(a)").unwrap();
        let root = ast.root();
        assert!(!ast.group(root).unwrap().has_parens);
        assert!(ast.group(ast.left(root).unwrap()).unwrap().has_parens);
    }

    #[test]
    fn test_field_group() {
        let ast = parse_query("title:(quick fox)").unwrap();
        let group = first_clause(&ast);
        assert_eq!(group.field.as_deref(), Some("title"));
        assert!(group.as_group().unwrap().has_parens);
    }

    #[test]
    fn test_term_unescaped() {
        let ast = parse_query(r"a\:b").unwrap();
        let term = first_clause(&ast).as_term().unwrap();
        assert_eq!(term.term, r"a\:b");
        assert_eq!(term.unescaped_term, "a:b");
    }

    #[test]
    fn test_shorthand_range_bounds() {
        let ast = parse_query("date:>2020").unwrap();
        let NodeKind::Range(range) = &first_clause(&ast).kind else {
            panic!("expected a range");
        };
        assert_eq!(range.min.as_deref(), Some("2020"));
        assert_eq!(range.max, None);
        assert!(!range.is_min_inclusive());
    }

    #[test]
    fn test_exists_node_carries_field() {
        let ast = parse_query("_exists_:title").unwrap();
        let node = first_clause(&ast);
        assert_eq!(node.kind, NodeKind::Exists);
        assert_eq!(node.field.as_deref(), Some("title"));
    }

    #[test]
    fn test_prefix_and_negation() {
        let ast = parse_query("-a").unwrap();
        assert_eq!(first_clause(&ast).prefix, Some(Prefix::MustNot));

        let ast = parse_query("NOT a").unwrap();
        assert_eq!(first_clause(&ast).negation, Negation::Negated);

        let ast = parse_query("NOT NOT a").unwrap();
        assert_eq!(first_clause(&ast).negation, Negation::NotNegated);
    }

    #[test]
    fn test_empty_query() {
        let ast = parse_query("").unwrap();
        assert_eq!(ast.children(ast.root()).count(), 0);
        assert_eq!(to_query_string(&ast), "");
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[test]
    fn test_unclosed_group() {
        let error = parse_query("(a b").unwrap_err();
        assert!(error.message.contains("Expected RParen"));
        assert_eq!(error.position, 4);
    }

    #[test]
    fn test_dangling_operator() {
        assert!(parse_query("a AND").is_err());
        assert!(parse_query("AND a").is_err());
        assert!(parse_query("a AND OR b").is_err());
    }

    #[test]
    fn test_unmatched_close() {
        let error = parse_query("a)").unwrap_err();
        assert_eq!(error.position, 1);
    }

    #[test]
    fn test_range_without_to() {
        let error = parse_query("price:[10 20]").unwrap_err();
        assert!(error.message.contains("Expected TO"));
    }

    #[test]
    fn test_unterminated_phrase() {
        assert!(parse_query("title:\"open").is_err());
    }

    #[test]
    fn test_parse_error_converts_to_query_error() {
        let error: QueryError = parse_query("(").unwrap_err().into();
        assert!(matches!(error, QueryError::Parse(_)));
    }
}
