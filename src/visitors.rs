//! The passes a [`Pipeline`](crate::Pipeline) is assembled from.
//!
//! A typical pipeline runs them in this order:
//!
//! | pass                           | does                                        |
//! |--------------------------------|---------------------------------------------|
//! | [`IncludeVisitor`]             | splices `@include:name` fragments           |
//! | [`AliasResolverVisitor`]       | scoped alias renames                        |
//! | [`FieldResolverVisitor`]       | callback / flat-map field renames           |
//! | [`AssignOperationTypeVisitor`] | `op:field` shorthand for aggregations/sorts |
//! | [`InvertQueryVisitor`]         | complement with protected fields            |
//! | [`RemoveFieldsVisitor`]        | drops clauses on given fields               |
//! | [`CleanupQueryVisitor`]        | structural normalization                    |
//! | [`ValidationVisitor`]          | usage accounting and policy                 |

pub mod alias;
pub mod cleanup;
pub mod field_resolver;
pub mod include;
pub mod invert;
pub mod operation_type;
pub mod referenced_fields;
pub mod remove_fields;
pub mod validation;

pub use alias::{AliasMap, AliasResolver, AliasResolverVisitor, ResolvedAlias};
pub use cleanup::CleanupQueryVisitor;
pub use field_resolver::{FieldResolverVisitor, hierarchical_resolver, resolve_hierarchical};
pub use include::{INCLUDE_FIELD, IncludeVisitor};
pub use invert::InvertQueryVisitor;
pub use operation_type::AssignOperationTypeVisitor;
pub use referenced_fields::{ReferencedFieldsVisitor, referenced_fields, referenced_fields_within};
pub use remove_fields::RemoveFieldsVisitor;
pub use validation::{ValidationOptions, ValidationResult, ValidationVisitor, validate_query};
