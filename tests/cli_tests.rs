#![cfg(feature = "cli")]

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use lucene_query::cli::{
        CheckOptions, CliError, InvertOptions, execute_check, execute_format, execute_invert,
    };

    // Helper functions
    fn write_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lq-cli-tests-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    // ========================================================================
    // Format
    // ========================================================================

    #[test]
    fn test_format() {
        assert_eq!(execute_format("((value))  &&  !b").unwrap(), "value AND NOT b");
    }

    #[test]
    fn test_format_parse_error() {
        assert!(matches!(execute_format("(a"), Err(CliError::Query(_))));
    }

    // ========================================================================
    // Invert
    // ========================================================================

    #[test]
    fn test_invert() {
        let options = InvertOptions {
            query: "status:open organizationId:1".to_string(),
            non_inverted_fields: vec!["organizationId".to_string()],
            alternate_criteria: None,
        };
        assert_eq!(
            execute_invert(&options).unwrap(),
            "NOT status:open organizationId:1"
        );
    }

    #[test]
    fn test_invert_with_alternate() {
        let options = InvertOptions {
            query: "deleted".to_string(),
            non_inverted_fields: Vec::new(),
            alternate_criteria: Some("archived:true".to_string()),
        };
        assert_eq!(execute_invert(&options).unwrap(), "(archived:true OR NOT deleted)");
    }

    // ========================================================================
    // Check
    // ========================================================================

    #[test]
    fn test_check_resolves_and_validates() {
        let options = CheckOptions {
            query: "@include:open user:bob".to_string(),
            field_map: Some(write_config("fields.json", r#"{ "account": "account_id" }"#)),
            aliases: Some(write_config("aliases.json", r#"{ "user": "account" }"#)),
            includes: Some(write_config("includes.json", r#"{ "open": "status:open" }"#)),
            policy: Some(write_config(
                "policy.json",
                r#"{ "restricted_fields": ["status"], "should_throw": true }"#,
            )),
            pretty: false,
        };

        let output = execute_check(&options).unwrap();
        assert_eq!(output.query, "(status:open) account_id:bob");
        assert!(!output.validation.is_valid);
        assert_eq!(output.validation.errors, vec!["Field is restricted: status"]);
    }

    #[test]
    fn test_check_bad_json() {
        let options = CheckOptions {
            query: "a".to_string(),
            policy: Some(write_config("broken.json", "{ not json")),
            ..CheckOptions::default()
        };
        assert!(matches!(execute_check(&options), Err(CliError::Json(_, _))));
    }

    #[test]
    fn test_check_missing_file() {
        let options = CheckOptions {
            query: "a".to_string(),
            field_map: Some(PathBuf::from("/nonexistent/lq/fields.json")),
            ..CheckOptions::default()
        };
        assert!(matches!(execute_check(&options), Err(CliError::Io(_))));
    }
}
