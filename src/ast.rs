//! # Lucene Query Tree
//!
//! This module defines the intermediate representation every pass in the
//! crate operates on: an arena of [`QueryNode`]s addressed by [`NodeId`].
//!
//! ## Architecture Overview
//!
//! - **[node]** - Node variants and their shared fields (field, negation, prefix, boost)
//! - **[tree]** - The [`QueryAst`] arena with parent links and in-place splicing
//! - **[annotations]** - Typed per-node side tables passes use to talk to each other
//! - **[tokens]** - Lexical tokens of the reference grammar
//!
//! ## Shape
//!
//! A clause sequence is a right-leaning chain of groups:
//!
//! ```text
//! a b c        Group { left: a, right: Group { left: b, right: c } }
//! f:(x y)      Group { field: f, has_parens, left: x, right: y }
//! NOT (a)      Group { negation: Negated, has_parens, left: a }
//! ```
//!
//! The root is always a group without parentheses. Children are owned by
//! exactly one parent; `parent` is a plain index used for splicing only
//! ([`QueryAst::replace_self`], [`QueryAst::remove_self`]).
//!
//! ## Negation
//!
//! Negation is tri-state ([`Negation`]) so that `NOT NOT x` can be told apart
//! from `x` while groups are being merged.
pub mod annotations;
pub mod node;
pub mod tokens;
pub mod tree;

pub use annotations::{
    AnnotationKey, Annotations, INCLUDE_NAME, OPERATION_TYPE, ORIGINAL_FIELD, UNRESOLVED_FIELD,
};
pub use node::{
    GroupNode, Negation, NodeId, NodeKind, Operator, Prefix, QueryNode, RangeNode, TermNode,
    unescape,
};
pub use tokens::Token;
pub use tree::{QueryAst, Sequence};
