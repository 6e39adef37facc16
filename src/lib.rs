pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod error;
pub mod lexer;
pub mod mapping;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod visitor;
pub mod visitors;

pub use ast::{Negation, NodeId, NodeKind, Operator, Prefix, QueryAst, QueryNode, Token};
pub use context::{QueryContext, QueryType, Resolution};
pub use error::{ParseError, QueryError, Result};
pub use lexer::Lexer;
pub use mapping::{FieldMetadata, FieldMetadataCache, FieldType};
pub use output::{node_to_string, to_query_string};
pub use parser::{LuceneQueryParser, Parser, QueryParser, parse_query};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use visitor::{ChainableVisitor, MutatingVisitor, QueryVisitor};
