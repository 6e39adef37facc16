/// Index of a node inside a [`QueryAst`](crate::ast::QueryAst) arena.
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Explicit negation state of a node.
///
/// "No negation written" and "explicitly not negated" are different states:
/// the second one is what a double negation collapses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Negation {
    #[default]
    Unspecified,
    Negated,
    NotNegated,
}

impl Negation {
    pub fn is_negated(self) -> bool {
        matches!(self, Negation::Negated)
    }

    pub fn is_explicit(self) -> bool {
        !matches!(self, Negation::Unspecified)
    }

    /// Combines the negation of an enclosing node with the negation of the
    /// node it wraps.
    ///
    /// | outer       | inner       | result      |
    /// |-------------|-------------|-------------|
    /// | Unspecified | x           | x           |
    /// | x           | Unspecified | x           |
    /// | Negated     | Negated     | NotNegated  |
    /// | NotNegated  | NotNegated  | NotNegated  |
    /// | Negated     | NotNegated  | Negated     |
    pub fn merge(self, inner: Negation) -> Negation {
        use Negation::*;
        match (self, inner) {
            (Unspecified, other) | (other, Unspecified) => other,
            (Negated, Negated) | (NotNegated, NotNegated) => NotNegated,
            (Negated, NotNegated) | (NotNegated, Negated) => Negated,
        }
    }

    /// Logical complement; an unspecified state counts as not negated.
    pub fn invert(self) -> Negation {
        match self {
            Negation::Negated => Negation::NotNegated,
            Negation::Unspecified | Negation::NotNegated => Negation::Negated,
        }
    }
}

/// Lucene occurrence prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `+term`
    Must,
    /// `-term`
    MustNot,
}

impl Prefix {
    pub fn as_char(self) -> char {
        match self {
            Prefix::Must => '+',
            Prefix::MustNot => '-',
        }
    }
}

/// Boolean operator joining the left and right side of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// Whitespace separated; meaning comes from the context's default operator.
    #[default]
    Default,
    And,
    Or,
}

/// A binary link in a clause sequence.
///
/// `a b c` is stored as `Group { left: a, right: Group { left: b, right: c } }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub operator: Operator,
    pub has_parens: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermNode {
    /// Term text as written, escapes included.
    pub term: String,
    pub unescaped_term: String,
    pub is_quoted: bool,
    pub is_regex: bool,
}

impl TermNode {
    pub fn new(term: impl Into<String>) -> Self {
        let term = term.into();
        let unescaped_term = unescape(&term);
        TermNode {
            term,
            unescaped_term,
            is_quoted: false,
            is_regex: false,
        }
    }

    pub fn quoted(term: impl Into<String>) -> Self {
        TermNode {
            is_quoted: true,
            ..TermNode::new(term)
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        TermNode {
            unescaped_term: pattern.clone(),
            term: pattern,
            is_quoted: false,
            is_regex: true,
        }
    }

    /// True for unquoted terms starting with `*` or `?`.
    pub fn has_leading_wildcard(&self) -> bool {
        !self.is_quoted && !self.is_regex && self.term.starts_with(['*', '?'])
    }

    pub fn has_wildcard(&self) -> bool {
        !self.is_quoted && !self.is_regex && self.unescaped_term.contains(['*', '?'])
    }
}

/// Range bounds. `None` inclusiveness means inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeNode {
    pub min: Option<String>,
    pub max: Option<String>,
    pub min_inclusive: Option<bool>,
    pub max_inclusive: Option<bool>,
}

impl RangeNode {
    pub fn between(min: impl Into<String>, max: impl Into<String>) -> Self {
        RangeNode {
            min: Some(min.into()),
            max: Some(max.into()),
            min_inclusive: Some(true),
            max_inclusive: Some(true),
        }
    }

    pub fn is_min_inclusive(&self) -> bool {
        self.min_inclusive.unwrap_or(true)
    }

    pub fn is_max_inclusive(&self) -> bool {
        self.max_inclusive.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group(GroupNode),
    Term(TermNode),
    Range(RangeNode),
    Exists,
    Missing,
}

impl NodeKind {
    /// Short label used for diagnostics and operation accounting.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Group(_) => "group",
            NodeKind::Term(term) if term.is_regex => "regex",
            NodeKind::Term(term) if term.has_wildcard() => "wildcard",
            NodeKind::Term(_) => "term",
            NodeKind::Range(_) => "range",
            NodeKind::Exists => "exists",
            NodeKind::Missing => "missing",
        }
    }
}

/// A single query node. Children and parent are ids into the owning arena.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryNode {
    pub kind: NodeKind,
    pub field: Option<String>,
    pub negation: Negation,
    pub prefix: Option<Prefix>,
    pub boost: Option<String>,
    pub proximity: Option<String>,
    pub(crate) parent: Option<NodeId>,
}

impl QueryNode {
    pub fn new(kind: NodeKind) -> Self {
        QueryNode {
            kind,
            field: None,
            negation: Negation::Unspecified,
            prefix: None,
            boost: None,
            proximity: None,
            parent: None,
        }
    }

    pub fn group(group: GroupNode) -> Self {
        QueryNode::new(NodeKind::Group(group))
    }

    pub fn term(term: TermNode) -> Self {
        QueryNode::new(NodeKind::Term(term))
    }

    pub fn range(range: RangeNode) -> Self {
        QueryNode::new(NodeKind::Range(range))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        QueryNode::new(NodeKind::Exists).with_field(field)
    }

    pub fn missing(field: impl Into<String>) -> Self {
        QueryNode::new(NodeKind::Missing).with_field(field)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_negation(mut self, negation: Negation) -> Self {
        self.negation = negation;
        self
    }

    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The field, treating an empty string the same as no field.
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref().filter(|field| !field.is_empty())
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match &mut self.kind {
            NodeKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_term(&self) -> Option<&TermNode> {
        match &self.kind {
            NodeKind::Term(term) => Some(term),
            _ => None,
        }
    }

    pub fn as_term_mut(&mut self) -> Option<&mut TermNode> {
        match &mut self.kind {
            NodeKind::Term(term) => Some(term),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Boost, proximity or prefix set on the node.
    pub fn has_modifiers(&self) -> bool {
        self.prefix.is_some() || self.boost.is_some() || self.proximity.is_some()
    }
}

/// Removes backslash escapes from a raw term.
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(ch);
        }
    }
    result
}
