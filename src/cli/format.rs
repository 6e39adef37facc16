//! Canonical formatting

use super::CliError;
use crate::{Pipeline, QueryContext, parse_query, to_query_string, visitors::CleanupQueryVisitor};

/// Parse, clean up and re-serialize a query.
pub fn execute_format(query: &str) -> Result<String, CliError> {
    let mut ast = parse_query(query)?;
    Pipeline::builder()
        .add(CleanupQueryVisitor::new(), 0)
        .build()
        .run(&mut ast, &mut QueryContext::new())?;
    Ok(to_query_string(&ast))
}
