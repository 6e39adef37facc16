// tests/lexer_tests.rs

use lucene_query::ast::Token;
use lucene_query::lexer::Lexer;

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            return tokens;
        }
        tokens.push(token);
    }
}

fn term(text: &str) -> Token {
    Token::Term(text.to_string())
}

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        ("!", Token::Not),
        ("~", Token::Proximity(String::new())),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

#[test]
fn test_two_char_operators() {
    assert_eq!(tokens("&&"), vec![Token::And]);
    assert_eq!(tokens("||"), vec![Token::Or]);
    assert_eq!(tokens("!="), vec![term("!=")]);
    assert_eq!(tokens("&"), vec![term("&")]);
}

// ============================================================================
// Prefixes
// ============================================================================

#[test]
fn test_prefix_needs_following_term() {
    assert_eq!(tokens("+a"), vec![Token::Plus, term("a")]);
    assert_eq!(tokens("-a"), vec![Token::Minus, term("a")]);
    assert_eq!(tokens("a - b"), vec![term("a"), term("-"), term("b")]);
}

#[test]
fn test_hyphen_inside_term() {
    assert_eq!(tokens("2020-01-01"), vec![term("2020-01-01")]);
    assert_eq!(tokens("-(a)"), vec![Token::Minus, Token::LParen, term("a"), Token::RParen]);
}

// ============================================================================
// Keywords
// ============================================================================

#[test]
fn test_keywords_are_uppercase_only() {
    assert_eq!(tokens("and or not"), vec![term("and"), term("or"), term("not")]);
    assert_eq!(tokens("AND"), vec![Token::And]);
}

#[test]
fn test_keyword_followed_by_colon_is_field() {
    assert_eq!(tokens("AND:x"), vec![Token::Field("AND".to_string()), term("x")]);
}

// ============================================================================
// Terms, Phrases and Patterns
// ============================================================================

#[test]
fn test_field_paths() {
    assert_eq!(
        tokens("nested.field:value @include:x"),
        vec![
            Token::Field("nested.field".to_string()),
            term("value"),
            Token::Field("@include".to_string()),
            term("x"),
        ]
    );
}

#[test]
fn test_shorthand_range_is_one_term() {
    assert_eq!(
        tokens("age:>=18"),
        vec![Token::Field("age".to_string()), term(">=18")]
    );
}

#[test]
fn test_escapes_preserved_in_phrase() {
    assert_eq!(
        tokens(r#""say \"hi\"""#),
        vec![Token::Quoted(r#"say \"hi\""#.to_string())]
    );
}

#[test]
fn test_regex() {
    assert_eq!(
        tokens("name:/jo[hn]+/"),
        vec![Token::Field("name".to_string()), Token::Regex("jo[hn]+".to_string())]
    );
}

#[test]
fn test_range_tokens() {
    assert_eq!(
        tokens("[10 TO *}"),
        vec![Token::LBracket, term("10"), term("TO"), term("*"), Token::RBrace]
    );
}

// ============================================================================
// Modifiers
// ============================================================================

#[test]
fn test_proximity_and_boost_values() {
    assert_eq!(
        tokens("roam~ fox~0.8^3"),
        vec![
            term("roam"),
            Token::Proximity(String::new()),
            term("fox"),
            Token::Proximity("0.8".to_string()),
            Token::Boost("3".to_string()),
        ]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_boost_without_number() {
    let mut lexer = Lexer::new("a^b");
    assert_eq!(lexer.next_token().unwrap(), term("a"));
    let error = lexer.next_token().unwrap_err();
    assert_eq!(error.position, 1);
}

#[test]
fn test_unterminated_regex() {
    let mut lexer = Lexer::new("x:/abc");
    lexer.next_token().unwrap();
    let error = lexer.next_token().unwrap_err();
    assert!(error.message.contains("Unterminated regular expression"));
    assert_eq!(error.position, 2);
}

#[test]
fn test_trailing_backslash() {
    assert!(Lexer::new(r"abc\").next_token().is_err());
}

#[test]
fn test_bare_colon() {
    assert!(Lexer::new(":x").next_token().is_err());
}
