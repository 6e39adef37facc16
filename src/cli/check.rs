//! Resolve and validate a query

use std::path::PathBuf;

use serde::Serialize;

use super::{CliError, config};
use crate::{
    Pipeline, QueryContext, Resolution, parse_query, to_query_string,
    visitors::{
        AliasResolverVisitor, FieldResolverVisitor, IncludeVisitor, ValidationResult,
        ValidationVisitor,
    },
};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub query: String,
    /// Flat dotted field map (JSON object of strings)
    pub field_map: Option<PathBuf>,
    /// Nested alias map
    pub aliases: Option<PathBuf>,
    /// Include fragments by name
    pub includes: Option<PathBuf>,
    /// Validation policy
    pub policy: Option<PathBuf>,
    pub pretty: bool,
}

/// What `lq check` prints.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    /// The query after includes and field renames
    pub query: String,
    pub validation: ValidationResult,
}

/// Run includes, aliases, field resolution and validation over a query.
///
/// An invalid query is not an error here; callers inspect
/// `validation.is_valid`.
pub fn execute_check(options: &CheckOptions) -> Result<CheckOutput, CliError> {
    let mut ast = parse_query(&options.query)?;

    let mut ctx = QueryContext::new();
    if let Some(path) = &options.policy {
        let mut policy = config::load_policy(path)?;
        policy.should_throw = false;
        ctx = ctx.with_validation_options(policy);
    }

    let mut builder = Pipeline::builder().add(ValidationVisitor::new(), 100);
    if let Some(path) = &options.includes {
        let includes = config::load_includes(path)?;
        ctx = ctx.with_include_resolver(move |name: &str| -> Resolution {
            includes.get(name).cloned().into()
        });
        builder = builder.add(IncludeVisitor::new(), 0);
    }
    if let Some(path) = &options.aliases {
        builder = builder.add(AliasResolverVisitor::with_resolver(config::load_aliases(path)?), 10);
    }
    if let Some(path) = &options.field_map {
        builder = builder.add(FieldResolverVisitor::with_field_map(config::load_field_map(path)?), 20);
    }

    builder.build().run(&mut ast, &mut ctx)?;

    Ok(CheckOutput {
        query: to_query_string(&ast),
        validation: ctx.take_validation(),
    })
}
