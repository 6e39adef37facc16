/// Lexical tokens of the reference Lucene-style grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare term, escapes preserved
    ///
    /// # Examples
    /// ```text
    /// value
    /// foo*
    /// >=10
    /// a\:b
    /// ```
    Term(String),

    /// Text between double quotes, escapes preserved
    ///
    /// # Examples
    /// ```text
    /// "hello world"
    /// ```
    Quoted(String),

    /// Pattern between slashes
    ///
    /// # Examples
    /// ```text
    /// /joh?n(ath[oa]n)/
    /// ```
    Regex(String),

    /// A term immediately followed by `:`; the colon is consumed
    ///
    /// # Examples
    /// ```text
    /// status:
    /// nested.field:
    /// @include:
    /// ```
    Field(String),

    /// `(`
    LParen,

    /// `)`
    RParen,

    /// `[` - inclusive range start
    LBracket,

    /// `]` - inclusive range end
    RBracket,

    /// `{` - exclusive range start
    LBrace,

    /// `}` - exclusive range end
    RBrace,

    /// `+` prefix
    Plus,

    /// `-` prefix
    Minus,

    /// `^2.5` - boost with its value
    Boost(String),

    /// `~` or `~3` - proximity / fuzziness with its optional value
    Proximity(String),

    /// `AND` or `&&`
    And,

    /// `OR` or `||`
    Or,

    /// `NOT` or `!`
    Not,

    /// End of input
    Eof,
}
