use crate::{ast::Token, error::ParseError};

/// Characters that end a bare term unless escaped.
fn is_term_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | '"' | '^' | '~' | ':')
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Character offset where the last returned token started.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.token_start)
    }

    /// Reads a bare term, keeping backslash escapes as written.
    fn read_term(&mut self) -> Result<String, ParseError> {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                result.push(ch);
                self.advance();
                match self.current_char() {
                    Some(escaped) => {
                        result.push(escaped);
                        self.advance();
                    }
                    None => return Err(self.error("Unexpected end of input after '\\'")),
                }
            } else if is_term_boundary(ch) {
                break;
            } else {
                result.push(ch);
                self.advance();
            }
        }
        Ok(result)
    }

    /// Reads up to the closing delimiter; escapes are kept so the serializer
    /// can write the text back unchanged.
    fn read_delimited(&mut self, delimiter: char, what: &str) -> Result<String, ParseError> {
        let mut result = String::new();
        self.advance(); // opening delimiter

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == delimiter => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    result.push(ch);
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        result.push(escaped);
                        self.advance();
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error(format!("Unterminated {what}: missing closing '{delimiter}'")))
    }

    /// Digits and dots following `^` or `~`.
    fn read_modifier_value(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '.' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn followed_by_term(&self) -> bool {
        self.peek_char(1).is_some_and(|ch| !ch.is_whitespace())
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('[') => {
                self.advance();
                Token::LBracket
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('{') => {
                self.advance();
                Token::LBrace
            }
            Some('}') => {
                self.advance();
                Token::RBrace
            }
            Some('"') => Token::Quoted(self.read_delimited('"', "phrase")?),
            Some('/') => Token::Regex(self.read_delimited('/', "regular expression")?),
            Some('^') => {
                self.advance();
                let value = self.read_modifier_value();
                if value.is_empty() {
                    return Err(self.error("Expected a number after '^'"));
                }
                Token::Boost(value)
            }
            Some('~') => {
                self.advance();
                Token::Proximity(self.read_modifier_value())
            }
            Some('+') if self.followed_by_term() => {
                self.advance();
                Token::Plus
            }
            Some('-') if self.followed_by_term() => {
                self.advance();
                Token::Minus
            }
            Some('!') if self.peek_char(1) != Some('=') => {
                self.advance();
                Token::Not
            }
            Some('&') if self.peek_char(1) == Some('&') => {
                self.advance();
                self.advance();
                Token::And
            }
            Some('|') if self.peek_char(1) == Some('|') => {
                self.advance();
                self.advance();
                Token::Or
            }
            Some(':') => return Err(self.error("Unexpected ':' without a field name")),
            Some(_) => {
                let term = self.read_term()?;
                if self.current_char() == Some(':') {
                    self.advance();
                    Token::Field(term)
                } else {
                    match term.as_str() {
                        "AND" => Token::And,
                        "OR" => Token::Or,
                        "NOT" => Token::Not,
                        _ => Token::Term(term),
                    }
                }
            }
        };

        Ok(token)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("a AND b OR NOT c && d || !e");
    assert_eq!(lexer.next_token(), Ok(Token::Term("a".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::And));
    assert_eq!(lexer.next_token(), Ok(Token::Term("b".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Or));
    assert_eq!(lexer.next_token(), Ok(Token::Not));
    assert_eq!(lexer.next_token(), Ok(Token::Term("c".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::And));
    assert_eq!(lexer.next_token(), Ok(Token::Term("d".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Or));
    assert_eq!(lexer.next_token(), Ok(Token::Not));
    assert_eq!(lexer.next_token(), Ok(Token::Term("e".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_field_and_modifiers() {
    let mut lexer = Lexer::new("title:\"quick fox\"~2^1.5 -status:open");
    assert_eq!(lexer.next_token(), Ok(Token::Field("title".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Quoted("quick fox".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Proximity("2".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Boost("1.5".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Minus));
    assert_eq!(lexer.next_token(), Ok(Token::Field("status".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Term("open".to_string())));
}

#[test]
fn test_escaped_colon_stays_in_term() {
    let mut lexer = Lexer::new(r"a\:b");
    assert_eq!(lexer.next_token(), Ok(Token::Term(r"a\:b".to_string())));
}

#[test]
fn test_unterminated_phrase() {
    let mut lexer = Lexer::new("\"open");
    let error = lexer.next_token().unwrap_err();
    assert_eq!(error.position, 0);
    assert!(error.message.contains("Unterminated phrase"));
}
