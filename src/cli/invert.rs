//! Query inversion

use super::CliError;
use crate::{
    Pipeline, QueryContext, parse_query, to_query_string,
    visitors::{CleanupQueryVisitor, InvertQueryVisitor},
};

/// Options for the invert command
#[derive(Debug, Clone, Default)]
pub struct InvertOptions {
    pub query: String,
    /// Fields that are never negated
    pub non_inverted_fields: Vec<String>,
    /// Criteria OR-ed into every inverted clause
    pub alternate_criteria: Option<String>,
}

pub fn execute_invert(options: &InvertOptions) -> Result<String, CliError> {
    let mut ast = parse_query(&options.query)?;

    let mut ctx = QueryContext::new();
    if let Some(alternate) = &options.alternate_criteria {
        ctx = ctx.with_alternate_inverted_criteria(parse_query(alternate)?);
    }

    Pipeline::builder()
        .add(InvertQueryVisitor::new(options.non_inverted_fields.iter().cloned()), 0)
        .add(CleanupQueryVisitor::new(), 10)
        .build()
        .run(&mut ast, &mut ctx)?;
    Ok(to_query_string(&ast))
}
