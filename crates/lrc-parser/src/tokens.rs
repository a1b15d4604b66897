use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// LR tokens.
///
/// Keywords are only reserved where the grammar expects them. Anywhere a
/// name is expected the parser accepts them as identifiers too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    // Keywords
    Import,
    Option,
    Alias,
    Private,
    Init,
    Embed,
    As,
    Map,

    // Literals
    StringLiteral(String),
    Identifier(&'src str),

    // Punctuation
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    LeftParen,    // (
    RightParen,   // )
    Comma,        // ,
    Dot,          // .
    Equals,       // =
    Question,     // ?
    Colon,        // :
    At,           // @

    // Comments
    LineComment(&'src str),

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Source text of a keyword, or `None` for every other token.
    pub fn keyword(&self) -> Option<&'static str> {
        let keyword = match self {
            Token::Import => "import",
            Token::Option => "option",
            Token::Alias => "alias",
            Token::Private => "private",
            Token::Init => "init",
            Token::Embed => "embed",
            Token::As => "as",
            Token::Map => "map",
            _ => return None,
        };
        Some(keyword)
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Newline)
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword() {
            return write!(f, "{keyword}");
        }
        match self {
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Identifier(name) => write!(f, "{name}"),

            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Equals => write!(f, "="),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::At => write!(f, "@"),

            Token::LineComment(comment) => write!(f, "//{comment}"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
            _ => Ok(()),
        }
    }
}
