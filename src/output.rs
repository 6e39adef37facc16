//! Query text serialization.
//!
//! Renders a (possibly rewritten) [`QueryAst`] back to Lucene query syntax.
//! Output is canonical rather than a copy of the input: whitespace is
//! normalized and `&&`/`||`/`!` are written as `AND`/`OR`/`NOT`.
//!
//! # Examples
//!
//! ```
//! use lucene_query::{parse_query, to_query_string};
//!
//! let ast = parse_query("price:[10 TO 20}  && !_missing_:title").unwrap();
//! assert_eq!(to_query_string(&ast), "price:[10 TO 20} AND NOT _missing_:title");
//! ```

use crate::ast::{NodeId, NodeKind, Operator, QueryAst, RangeNode, TermNode};

pub struct QueryPrinter<'a> {
    ast: &'a QueryAst,
}

impl<'a> QueryPrinter<'a> {
    pub fn new(ast: &'a QueryAst) -> Self {
        QueryPrinter { ast }
    }

    pub fn print(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.print_node(id, &mut out);
        out
    }

    fn print_node(&self, id: NodeId, out: &mut String) {
        let node = self.ast.node(id);

        if let Some(prefix) = node.prefix {
            out.push(prefix.as_char());
        }
        if node.negation.is_negated() {
            out.push_str("NOT ");
        }

        match &node.kind {
            NodeKind::Exists => out.push_str("_exists_:"),
            NodeKind::Missing => out.push_str("_missing_:"),
            _ => {
                if let Some(field) = node.field_name() {
                    out.push_str(field);
                    out.push(':');
                }
            }
        }

        match &node.kind {
            NodeKind::Group(group) => {
                if group.has_parens {
                    out.push('(');
                }
                if let Some(left) = group.left {
                    self.print_node(left, out);
                }
                if let Some(right) = group.right {
                    if group.left.is_some() {
                        out.push(' ');
                    }
                    match group.operator {
                        Operator::And => out.push_str("AND "),
                        Operator::Or => out.push_str("OR "),
                        Operator::Default => {}
                    }
                    self.print_node(right, out);
                }
                if group.has_parens {
                    out.push(')');
                }
            }
            NodeKind::Term(term) => self.print_term(term, out),
            NodeKind::Range(range) => self.print_range(range, out),
            NodeKind::Exists | NodeKind::Missing => {
                out.push_str(node.field.as_deref().unwrap_or_default());
            }
        }

        if let Some(proximity) = &node.proximity {
            out.push('~');
            out.push_str(proximity);
        }
        if let Some(boost) = &node.boost {
            out.push('^');
            out.push_str(boost);
        }
    }

    fn print_term(&self, term: &TermNode, out: &mut String) {
        if term.is_quoted {
            out.push('"');
            out.push_str(&term.term);
            out.push('"');
        } else if term.is_regex {
            out.push('/');
            out.push_str(&term.term);
            out.push('/');
        } else {
            out.push_str(&term.term);
        }
    }

    fn print_range(&self, range: &RangeNode, out: &mut String) {
        match (&range.min, &range.max) {
            (Some(min), None) => {
                out.push_str(if range.is_min_inclusive() { ">=" } else { ">" });
                out.push_str(min);
            }
            (None, Some(max)) => {
                out.push_str(if range.is_max_inclusive() { "<=" } else { "<" });
                out.push_str(max);
            }
            (min, max) => {
                out.push(if range.is_min_inclusive() { '[' } else { '{' });
                out.push_str(min.as_deref().unwrap_or("*"));
                out.push_str(" TO ");
                out.push_str(max.as_deref().unwrap_or("*"));
                out.push(if range.is_max_inclusive() { ']' } else { '}' });
            }
        }
    }
}

/// Renders the whole tree.
pub fn to_query_string(ast: &QueryAst) -> String {
    QueryPrinter::new(ast).print(ast.root())
}

/// Renders the subtree at `id`.
pub fn node_to_string(ast: &QueryAst, id: NodeId) -> String {
    QueryPrinter::new(ast).print(id)
}
