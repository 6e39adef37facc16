use std::mem;

use crate::{
    ast::{GroupNode, Negation, NodeId, Operator, Prefix, QueryAst, QueryNode, RangeNode, TermNode, Token},
    error::ParseError,
    lexer::Lexer,
};

/// Anything that turns query text into a [`QueryAst`].
///
/// Include expansion re-parses fragments through this trait, so a caller with
/// its own grammar can plug it in there.
pub trait QueryParser: Send + Sync {
    fn parse(&self, query: &str) -> Result<QueryAst, ParseError>;
}

/// The bundled Lucene-style grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuceneQueryParser;

impl QueryParser for LuceneQueryParser {
    fn parse(&self, query: &str) -> Result<QueryAst, ParseError> {
        Parser::new(Lexer::new(query))?.parse()
    }
}

/// Parses `query` with the bundled grammar.
///
/// ```
/// use lucene_query::{parse_query, to_query_string};
///
/// let ast = parse_query("title:(quick fox) AND -status:closed").unwrap();
/// assert_eq!(to_query_string(&ast), "title:(quick fox) AND -status:closed");
/// ```
pub fn parse_query(query: &str) -> Result<QueryAst, ParseError> {
    LuceneQueryParser.parse(query)
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_start: usize,
    ast: QueryAst,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            current_start: lexer.token_start(),
            lexer,
            current_token,
            ast: QueryAst::new(),
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_start = self.lexer.token_start();
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_start)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.error(format!(
                "Expected {:?}, got {:?}",
                expected, self.current_token
            )));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Parses the whole input. The root is always a group without parens.
    pub fn parse(mut self) -> Result<QueryAst, ParseError> {
        let clauses = self.parse_clauses()?;
        if !self.check(&Token::Eof) {
            return Err(self.error(format!("Unexpected {:?}", self.current_token)));
        }
        let root = self.ast.root();
        self.link(root, &clauses);
        Ok(self.ast)
    }

    /// Clauses up to `)` or the end of input, each with the operator that
    /// joins it to the previous one.
    fn parse_clauses(&mut self) -> Result<Vec<(Operator, NodeId)>, ParseError> {
        let mut clauses = Vec::new();
        let mut operator = Operator::Default;

        loop {
            let explicit = match self.current_token {
                Token::Eof | Token::RParen => break,
                Token::And => Operator::And,
                Token::Or => Operator::Or,
                _ => {
                    let clause = self.parse_clause()?;
                    clauses.push((mem::take(&mut operator), clause));
                    continue;
                }
            };
            if clauses.is_empty() || operator != Operator::Default {
                return Err(self.error(format!("Unexpected {:?}", self.current_token)));
            }
            operator = explicit;
            self.advance()?;
        }

        if operator != Operator::Default {
            return Err(self.error("Expected a clause after the operator"));
        }
        Ok(clauses)
    }

    /// Stores a clause sequence as a right-leaning chain under `group`.
    fn link(&mut self, group: NodeId, clauses: &[(Operator, NodeId)]) {
        match clauses {
            [] => {}
            [(_, only)] => self.ast.set_left(group, Some(*only)),
            [(_, first), (operator, second)] => {
                self.ast.set_left(group, Some(*first));
                self.ast.set_right(group, Some(*second));
                self.set_operator(group, *operator);
            }
            [(_, first), rest @ ..] => {
                self.ast.set_left(group, Some(*first));
                self.set_operator(group, rest[0].0);
                let link = self.ast.add(QueryNode::group(GroupNode::default()));
                self.ast.set_right(group, Some(link));
                self.link(link, rest);
            }
        }
    }

    fn set_operator(&mut self, group: NodeId, operator: Operator) {
        if let Some(group) = self.ast.group_mut(group) {
            group.operator = operator;
        }
    }

    fn parse_clause(&mut self) -> Result<NodeId, ParseError> {
        let mut prefix = None;
        let mut negation = Negation::Unspecified;
        loop {
            match self.current_token {
                Token::Plus => prefix = Some(Prefix::Must),
                Token::Minus => prefix = Some(Prefix::MustNot),
                Token::Not => negation = negation.merge(Negation::Negated),
                _ => break,
            }
            self.advance()?;
        }

        let id = self.parse_primary()?;
        self.parse_modifiers(id)?;

        let node = self.ast.node_mut(id);
        if prefix.is_some() {
            node.prefix = prefix;
        }
        node.negation = negation.merge(node.negation);
        Ok(id)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Field(field) => {
                self.advance()?;
                self.parse_field_value(field)
            }
            Token::LParen => {
                self.advance()?;
                self.parse_group(None)
            }
            Token::Term(term) => {
                self.advance()?;
                Ok(self.term_node(None, term))
            }
            Token::Quoted(term) => {
                self.advance()?;
                Ok(self.ast.add(QueryNode::term(TermNode::quoted(term))))
            }
            Token::Regex(pattern) => {
                self.advance()?;
                Ok(self.ast.add(QueryNode::term(TermNode::regex(pattern))))
            }
            token @ (Token::LBracket | Token::LBrace) => {
                self.current_token = token;
                self.parse_range(None)
            }
            token => Err(self.error(format!("Unexpected {token:?}"))),
        }
    }

    fn parse_field_value(&mut self, field: String) -> Result<NodeId, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::LParen => {
                self.advance()?;
                self.parse_group(Some(field))
            }
            Token::Term(name) if field == "_exists_" => {
                self.advance()?;
                Ok(self.ast.add(QueryNode::exists(name)))
            }
            Token::Term(name) if field == "_missing_" => {
                self.advance()?;
                Ok(self.ast.add(QueryNode::missing(name)))
            }
            Token::Term(term) => {
                self.advance()?;
                Ok(self.term_node(Some(field), term))
            }
            Token::Quoted(term) => {
                self.advance()?;
                Ok(self
                    .ast
                    .add(QueryNode::term(TermNode::quoted(term)).with_field(field)))
            }
            Token::Regex(pattern) => {
                self.advance()?;
                Ok(self
                    .ast
                    .add(QueryNode::term(TermNode::regex(pattern)).with_field(field)))
            }
            token @ (Token::LBracket | Token::LBrace) => {
                self.current_token = token;
                self.parse_range(Some(field))
            }
            token => Err(self.error(format!("Expected a value for {field}, got {token:?}"))),
        }
    }

    /// Called after the opening `(` was consumed.
    fn parse_group(&mut self, field: Option<String>) -> Result<NodeId, ParseError> {
        let clauses = self.parse_clauses()?;
        self.expect(Token::RParen)?;

        let mut node = QueryNode::group(GroupNode {
            has_parens: true,
            ..GroupNode::default()
        });
        node.field = field;
        let id = self.ast.add(node);
        self.link(id, &clauses);
        Ok(id)
    }

    fn parse_range(&mut self, field: Option<String>) -> Result<NodeId, ParseError> {
        let min_inclusive = self.check(&Token::LBracket);
        self.advance()?;
        let min = self.parse_range_bound()?;

        if !matches!(&self.current_token, Token::Term(to) if to == "TO") {
            return Err(self.error(format!(
                "Expected TO in range, got {:?}",
                self.current_token
            )));
        }
        self.advance()?;

        let max = self.parse_range_bound()?;
        let max_inclusive = match self.current_token {
            Token::RBracket => true,
            Token::RBrace => false,
            ref token => return Err(self.error(format!("Expected ']' or '}}', got {token:?}"))),
        };
        self.advance()?;

        let mut node = QueryNode::range(RangeNode {
            min: Some(min),
            max: Some(max),
            min_inclusive: Some(min_inclusive),
            max_inclusive: Some(max_inclusive),
        });
        node.field = field;
        Ok(self.ast.add(node))
    }

    fn parse_range_bound(&mut self) -> Result<String, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Term(bound) | Token::Quoted(bound) => {
                self.advance()?;
                Ok(bound)
            }
            token => Err(self.error(format!("Expected a range bound, got {token:?}"))),
        }
    }

    fn parse_modifiers(&mut self, id: NodeId) -> Result<(), ParseError> {
        loop {
            match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Boost(boost) => self.ast.node_mut(id).boost = Some(boost),
                Token::Proximity(proximity) => self.ast.node_mut(id).proximity = Some(proximity),
                token => {
                    self.current_token = token;
                    return Ok(());
                }
            }
            self.advance()?;
        }
    }

    /// Bare term, or a `>x` / `>=x` / `<x` / `<=x` shorthand range.
    fn term_node(&mut self, field: Option<String>, term: String) -> NodeId {
        let mut node = match shorthand_range(&term) {
            Some(range) => QueryNode::range(range),
            None => QueryNode::term(TermNode::new(term)),
        };
        node.field = field;
        self.ast.add(node)
    }
}

fn shorthand_range(term: &str) -> Option<RangeNode> {
    let (operator, value) = [">=", "<=", ">", "<"]
        .into_iter()
        .find_map(|operator| term.strip_prefix(operator).map(|value| (operator, value)))?;
    if value.is_empty() {
        return None;
    }

    let bound = Some(value.to_string());
    Some(match operator {
        ">=" | ">" => RangeNode {
            min: bound,
            min_inclusive: Some(operator == ">="),
            ..RangeNode::default()
        },
        _ => RangeNode {
            max: bound,
            max_inclusive: Some(operator == "<="),
            ..RangeNode::default()
        },
    })
}
