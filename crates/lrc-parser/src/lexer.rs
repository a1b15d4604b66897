//! Lexical analyzer for LR source text.
//!
//! [`tokenize`] turns source text into [`PositionedToken`]s. Errors do not
//! stop the lexer: it records a diagnostic, skips one character and keeps
//! going, so a single pass reports every lexical problem in the file.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to lexer errors through `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// Start of the error span; it ends at the failure position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Escape sequence after a backslash inside a string literal.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();
    '\\'.parse_next(input)?;

    let escaped: IResult<char> = one_of(['n', 'r', 't', '\\', '"', '\'', '0']).parse_next(input);
    match escaped {
        Ok(c) => Ok(match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        }),
        Err(_) => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E003,
                message: "invalid escape sequence",
                help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`, `\\'`, `\\0`"),
                start: escape_start,
            },
        ))),
    }
}

/// Double-quoted string literal. Strings never span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    let content = repeat(0.., alt((string_escape, none_of(['"', '\\', '\n']))))
        .fold(String::new, |mut acc, c| {
            acc.push(c);
            acc
        });

    cut_err(terminated(content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add a closing `\"` before the end of the line"),
            start,
        })
        .map(Token::StringLiteral)
        .parse_next(input)
}

fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Keywords, only when not followed by an identifier character.
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("import").value(Token::Import),
            literal("option").value(Token::Option),
            literal("alias").value(Token::Alias),
            literal("private").value(Token::Private),
            literal("init").value(Token::Init),
            literal("embed").value(Token::Embed),
            literal("as").value(Token::As),
            literal("map").value(Token::Map),
        )),
        peek(not(one_of(is_ident_char))),
    )
    .parse_next(input)
}

fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_ident_char)
        .verify(|s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
        .map(Token::Identifier)
        .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        ','.value(Token::Comma),
        '.'.value(Token::Dot),
        '='.value(Token::Equals),
        '?'.value(Token::Question),
        ':'.value(Token::Colon),
        '@'.value(Token::At),
    ))
    .parse_next(input)
}

/// Whitespace other than newlines.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        keyword,
        identifier,
        punctuation,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start..end)))
}

/// Accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(err) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(err, error_pos));
                    // Resume on the next character.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Build a diagnostic from the first [`LexerDiagnostic`] context, or an
    /// unexpected-character error when there is none.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..error_pos), code.description());
            if let Some(help) = help {
                diag = diag.with_help(*help);
            }
            return diag;
        }

        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(
                Span::new(error_pos..error_pos.saturating_add(1)),
                ErrorCode::E002.description(),
            )
    }
}

/// Tokenize LR source, collecting every lexical error.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}
