//! Parser for LR source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the syntax tree defined in [`parser_types`](super::parser_types). The public
//! entry point is [`build_unit`].
//!
//! Line breaks are significant in one place only: a basic field's name,
//! dependency list and type must share a line. Everywhere else whitespace,
//! newlines and comments are interchangeable.

use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, preceded, repeat, separated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = LrTokenSlice<'src>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;
/// Type alias for winnow TokenSlice with our positioned tokens
type LrTokenSlice<'src> = TokenSlice<'src, PositionedToken<'src>>;

/// Commit to the parse in `f`: any failure becomes a Cut error that
/// remembers where the committed region started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Helper to create a Cut error with StartOffset context
fn cut_error_with_offset(input: &Input<'_>, label: &'static str) -> ErrMode<ContextError<Context>> {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    e.push(Context::StartOffset(input.eof_offset()));
    ErrMode::Cut(e)
}

fn is_at_end(input: &Input<'_>) -> bool {
    input.eof_offset() == 0
}

/// True when the next token is `expected`, without consuming it.
fn next_is(input: &mut Input<'_>, expected: &Token<'_>) -> bool {
    let checkpoint = input.checkpoint();
    let found = input
        .next_token()
        .is_some_and(|token| token.token == *expected);
    input.reset(&checkpoint);
    found
}

/// Parse one punctuation token, returning its span
fn symbol<'src>(expected: Token<'static>) -> impl FnMut(&mut Input<'src>) -> IResult<Span> {
    move |input: &mut Input<'src>| {
        any.verify(|token: &PositionedToken<'_>| token.token == expected)
            .map(|token: &PositionedToken<'_>| token.span)
            .parse_next(input)
    }
}

/// Parse whitespace, newlines and comments
fn ws_comment(input: &mut Input<'_>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| {
        matches!(
            token.token,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    })
    .void()
    .parse_next(input)
}

/// Parse zero or more whitespace/comments
fn ws_comments0(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parse whitespace that stays on the current line
fn inline_ws0(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        0..,
        any.verify(|token: &PositionedToken<'_>| matches!(token.token, Token::Whitespace)),
    )
    .map(|()| ())
    .parse_next(input)
}

fn inline_ws1(input: &mut Input<'_>) -> IResult<()> {
    repeat(
        1..,
        any.verify(|token: &PositionedToken<'_>| matches!(token.token, Token::Whitespace)),
    )
    .map(|()| ())
    .parse_next(input)
}

/// Collect the comment lines in front of a declaration, skipping blank
/// space between them.
fn leading_comments(input: &mut Input<'_>) -> IResult<Vec<String>> {
    repeat(
        0..,
        any.verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::LineComment(text) => Some(Some(text.to_string())),
            Token::Whitespace | Token::Newline => Some(None),
            _ => None,
        }),
    )
    .fold(Vec::new, |mut comments, line: Option<String>| {
        comments.extend(line);
        comments
    })
    .parse_next(input)
}

/// Skip the rest of a declaration's line up to and including a trailing
/// comment. Trailing comments never document the next declaration.
fn trailing_comment(input: &mut Input<'_>) -> IResult<()> {
    inline_ws0.parse_next(input)?;
    opt(any.verify(|token: &PositionedToken<'_>| matches!(token.token, Token::LineComment(_))))
        .void()
        .parse_next(input)
}

/// Parse one name segment
///
/// Keywords are accepted: `map`, `init` or `as` are valid names wherever the
/// grammar expects a name.
fn name_segment<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &PositionedToken<'src>| match &token.token {
        Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
        other => other
            .keyword()
            .map(|keyword| Spanned::new(keyword, token.span)),
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn name(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    name_segment
        .map(|segment| segment.map(|name| name.to_string()))
        .parse_next(input)
}

/// Parse a dotted name such as `os.file` or `aws.ec2.instance`
fn dotted_name(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    let first = name_segment.parse_next(input)?;
    let mut path = first.inner().to_string();
    let mut span = first.span();

    while next_is(input, &Token::Dot) {
        symbol(Token::Dot).parse_next(input)?;
        let next = cut_err(input, |input| {
            name_segment
                .context(Context::Label("name after `.`"))
                .parse_next(input)
        })?;
        path.push('.');
        path.push_str(next.inner());
        span = span.union(next.span());
    }

    Ok(Spanned::new(path, span))
}

/// Parse string literal
fn string_literal(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

fn comma(input: &mut Input<'_>) -> IResult<()> {
    (ws_comments0, symbol(Token::Comma), ws_comments0)
        .void()
        .parse_next(input)
}

/// Parse a parenthesized list of field names: `(path, size)`
///
/// `()` yields an empty list, which is different from no list at all.
fn dependency_list(input: &mut Input<'_>) -> IResult<Vec<Spanned<String>>> {
    symbol(Token::LeftParen).parse_next(input)?;
    cut_err(input, |input| {
        ws_comments0.parse_next(input)?;
        let names = separated(0.., name, comma).parse_next(input)?;
        ws_comments0.parse_next(input)?;
        symbol(Token::RightParen)
            .context(Context::Label("`)` after dependency list"))
            .parse_next(input)?;
        Ok(names)
    })
}

/// Parse a list type: `[]T`
fn list_type(input: &mut Input<'_>) -> IResult<types::TypeExpr> {
    let open = symbol(Token::LeftBracket).parse_next(input)?;
    cut_err(input, |input| {
        symbol(Token::RightBracket)
            .context(Context::Label("`]` in list type"))
            .parse_next(input)?;
        let element = type_expr
            .context(Context::Label("list element type"))
            .parse_next(input)?;
        let span = open.union(element.span());
        Ok(types::TypeExpr::List(Box::new(element), span))
    })
}

/// Parse a map type: `map[K]V`
fn map_type(input: &mut Input<'_>) -> IResult<types::TypeExpr> {
    let keyword = symbol(Token::Map).parse_next(input)?;
    symbol(Token::LeftBracket).parse_next(input)?;
    cut_err(input, |input| {
        let key = dotted_name
            .context(Context::Label("map key type"))
            .parse_next(input)?;
        symbol(Token::RightBracket)
            .context(Context::Label("`]` after map key type"))
            .parse_next(input)?;
        let value = type_expr
            .context(Context::Label("map value type"))
            .parse_next(input)?;
        let span = keyword.union(value.span());
        Ok(types::TypeExpr::Map {
            key,
            value: Box::new(value),
            span,
        })
    })
}

/// Parse a type expression
///
/// Examples:
/// - `string`
/// - `[]os.file`
/// - `map[string][]int`
fn type_expr(input: &mut Input<'_>) -> IResult<types::TypeExpr> {
    alt((
        list_type,
        map_type,
        dotted_name.map(types::TypeExpr::Simple),
    ))
    .context(Context::Label("type"))
    .parse_next(input)
}

/// Parse one initializer argument: `name[?] [:] [type]`
fn typed_arg(input: &mut Input<'_>) -> IResult<types::TypedArg> {
    let name = name.parse_next(input)?;
    inline_ws0.parse_next(input)?;
    let optional = opt(symbol(Token::Question)).parse_next(input)?.is_some();
    inline_ws0.parse_next(input)?;
    opt(symbol(Token::Colon)).parse_next(input)?;
    inline_ws0.parse_next(input)?;

    let ty = if next_is(input, &Token::Comma) || next_is(input, &Token::RightParen) {
        None
    } else {
        opt(type_expr).parse_next(input)?
    };

    Ok(types::TypedArg { name, optional, ty })
}

/// Parse an initializer: `init(path string, mode? int)`
fn init_field(input: &mut Input<'_>) -> IResult<types::FieldKind> {
    let keyword = symbol(Token::Init).parse_next(input)?;
    inline_ws0.parse_next(input)?;
    symbol(Token::LeftParen).parse_next(input)?;

    cut_err(input, |input| {
        ws_comments0.parse_next(input)?;
        let args = separated(0.., typed_arg, comma).parse_next(input)?;
        ws_comments0.parse_next(input)?;
        let close = symbol(Token::RightParen)
            .context(Context::Label("`)` after initializer arguments"))
            .parse_next(input)?;
        Ok(types::FieldKind::Init(types::Init {
            args,
            span: keyword.union(close),
        }))
    })
}

/// Parse an embed: `embed os.file [as file]`
fn embed_field(input: &mut Input<'_>) -> IResult<types::FieldKind> {
    symbol(Token::Embed).parse_next(input)?;
    inline_ws1.parse_next(input)?;

    cut_err(input, |input| {
        let ty = dotted_name
            .context(Context::Label("embedded resource type"))
            .parse_next(input)?;
        let alias = opt(preceded(
            (inline_ws1, symbol(Token::As), inline_ws1),
            name.context(Context::Label("embed alias")),
        ))
        .parse_next(input)?;
        Ok(types::FieldKind::Embed(types::Embed { ty, alias }))
    })
}

/// Parse a basic field: `name [(deps)] [type]`
///
/// Returns `None` for a bare name, which carries no information.
fn basic_field(input: &mut Input<'_>) -> IResult<Option<types::FieldKind>> {
    let name = name.parse_next(input)?;
    inline_ws0.parse_next(input)?;
    let args = opt(dependency_list).parse_next(input)?;
    inline_ws0.parse_next(input)?;
    let ty = opt(type_expr).parse_next(input)?;

    match (args, ty) {
        (None, None) => Ok(None),
        (args, Some(ty)) => Ok(Some(types::FieldKind::Basic(types::BasicField {
            name,
            args,
            ty,
            is_embedded: false,
        }))),
        (Some(_), None) => Err(cut_error_with_offset(input, "field type")),
    }
}

fn field_kind(input: &mut Input<'_>) -> IResult<Option<types::FieldKind>> {
    alt((init_field.map(Some), embed_field.map(Some), basic_field))
        .context(Context::Label("field"))
        .parse_next(input)
}

/// Parse the collection marker at the top of a body: `[]os.file(path)`
fn list_marker(input: &mut Input<'_>) -> IResult<types::ListType> {
    (symbol(Token::LeftBracket), symbol(Token::RightBracket)).parse_next(input)?;
    cut_err(input, |input| {
        inline_ws0.parse_next(input)?;
        let element = dotted_name
            .context(Context::Label("list element type"))
            .parse_next(input)?;
        inline_ws0.parse_next(input)?;
        let args = opt(dependency_list).parse_next(input)?;
        Ok(types::ListType { element, args })
    })
}

/// Parse a resource body
fn body(input: &mut Input<'_>) -> IResult<(Option<types::ListType>, Vec<types::Field>, Span)> {
    let open = symbol(Token::LeftBrace).parse_next(input)?;

    cut_err(input, |input| {
        let mut comments = leading_comments.parse_next(input)?;
        let list_type = opt(list_marker).parse_next(input)?;
        if list_type.is_some() {
            comments.clear();
            trailing_comment.parse_next(input)?;
        }

        let mut fields = Vec::new();
        loop {
            comments.extend(leading_comments.parse_next(input)?);
            if next_is(input, &Token::RightBrace) || is_at_end(input) {
                break;
            }
            let field_comments = std::mem::take(&mut comments);
            if let Some(kind) = field_kind.parse_next(input)? {
                fields.push(types::Field {
                    comments: field_comments,
                    docs: types::Docs::default(),
                    kind,
                });
            }
            trailing_comment.parse_next(input)?;
        }

        let close = symbol(Token::RightBrace)
            .context(Context::Label("`}` after resource body"))
            .parse_next(input)?;
        Ok((list_type, fields, open.union(close)))
    })
}

/// Parse `@defaults("...")`
fn defaults_annotation(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    symbol(Token::At).parse_next(input)?;
    cut_err(input, |input| {
        any.verify(|token: &PositionedToken<'_>| {
            matches!(token.token, Token::Identifier("defaults"))
        })
        .context(Context::Label("`defaults` annotation"))
        .parse_next(input)?;
        delimited(
            (symbol(Token::LeftParen), ws_comments0),
            string_literal,
            (ws_comments0, symbol(Token::RightParen)),
        )
        .context(Context::Label("defaults string"))
        .parse_next(input)
    })
}

/// Parse a resource declaration
///
/// Examples:
/// - `os.file`
/// - `private os.file.permissions { user_readable bool }`
/// - `files @defaults("path") { []os.file }`
fn resource(input: &mut Input<'_>, comments: Vec<String>) -> IResult<types::Resource> {
    let private = opt((symbol(Token::Private), inline_ws1)).parse_next(input)?;
    let id = dotted_name
        .context(Context::Label("resource name"))
        .parse_next(input)?;
    let mut span = private.map_or(id.span(), |(start, ())| start.union(id.span()));

    let defaults = opt(preceded(ws_comments0, defaults_annotation)).parse_next(input)?;
    if let Some(defaults) = &defaults {
        span = span.union(defaults.span());
    }

    let (list_type, fields) = match opt(preceded(ws_comments0, body)).parse_next(input)? {
        Some((list_type, fields, body_span)) => {
            span = span.union(body_span);
            (list_type, fields)
        }
        None => (None, Vec::new()),
    };

    Ok(types::Resource {
        comments,
        docs: types::Docs::default(),
        is_private: private.is_some(),
        id,
        defaults,
        list_type,
        fields,
        span,
    })
}

/// Parse `import "path"`
fn import(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    symbol(Token::Import).parse_next(input)?;
    cut_err(input, |input| {
        inline_ws0.parse_next(input)?;
        string_literal
            .context(Context::Label("import path"))
            .parse_next(input)
    })
}

/// Parse `option key = "value"`
fn option(input: &mut Input<'_>) -> IResult<(Spanned<String>, Spanned<String>)> {
    symbol(Token::Option).parse_next(input)?;
    inline_ws1.parse_next(input)?;
    let key = name.parse_next(input)?;
    inline_ws0.parse_next(input)?;
    symbol(Token::Equals).parse_next(input)?;

    cut_err(input, |input| {
        inline_ws0.parse_next(input)?;
        let value = string_literal
            .context(Context::Label("option value"))
            .parse_next(input)?;
        Ok((key, value))
    })
}

/// Parse `alias name = pkg.resource`
fn alias(input: &mut Input<'_>) -> IResult<types::Alias> {
    symbol(Token::Alias).parse_next(input)?;
    inline_ws1.parse_next(input)?;
    let name = dotted_name.parse_next(input)?;
    inline_ws0.parse_next(input)?;
    symbol(Token::Equals).parse_next(input)?;

    cut_err(input, |input| {
        inline_ws0.parse_next(input)?;
        let target = dotted_name
            .context(Context::Label("alias target"))
            .parse_next(input)?;
        Ok(types::Alias { name, target })
    })
}

/// Parse one top-level statement into `unit`
fn statement(
    input: &mut Input<'_>,
    comments: Vec<String>,
    unit: &mut types::Unit,
) -> IResult<()> {
    if let Some(path) = opt(import).parse_next(input)? {
        unit.imports.push(path);
    } else if let Some((key, value)) = opt(option).parse_next(input)? {
        unit.options.insert(key.into_inner(), value);
    } else if let Some(alias) = opt(alias).parse_next(input)? {
        unit.aliases.push(alias);
    } else {
        let resource = resource(input, comments).map_err(|mut e| {
            if let ErrMode::Backtrack(ctx) = &mut e {
                ctx.push(Context::Label("import, option, alias or resource"));
            }
            e
        })?;
        unit.resources.push(resource);
    }
    trailing_comment.parse_next(input)
}

fn unit(input: &mut Input<'_>) -> IResult<types::Unit> {
    let mut unit = types::Unit::default();
    loop {
        let comments = leading_comments.parse_next(input)?;
        if is_at_end(input) {
            break;
        }
        statement(input, comments, &mut unit)?;
    }
    Ok(unit)
}

/// Utility function to convert winnow errors to our custom error format
///
/// Extracts position information from error context (StartOffset) and calculates
/// precise error spans using the token array.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let start_remaining = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(*n),
            _ => None,
        }),
        _ => None,
    };

    let end_offset = tokens.len() - current_remaining;
    let start_offset = start_remaining.map(|r| tokens.len() - r).unwrap_or(0);

    let meaningful = |slice: &[PositionedToken]| -> Option<Span> {
        let first = slice.iter().find(|t| !t.is_trivia()).map(|t| t.span)?;
        let last = slice.iter().rev().find(|t| !t.is_trivia()).map(|t| t.span)?;
        Some(first.union(last))
    };
    let fallback = tokens.last().map(|t| t.span).unwrap_or_default();

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let contexts: Vec<String> = e
                .context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some(format!("expected {label}")),
                    _ => None,
                })
                .collect();

            let message = if contexts.is_empty() {
                "unexpected token or end of input".to_string()
            } else {
                contexts.join(" → ")
            };

            let examine_range = if start_offset < end_offset {
                start_offset..end_offset
            } else if end_offset < tokens.len() {
                if matches!(tokens[end_offset].token, Token::RightBrace | Token::RightParen) {
                    // Something is missing before the closing delimiter.
                    0..end_offset
                } else {
                    end_offset..end_offset + 1
                }
            } else {
                0..tokens.len()
            };
            let error_span = meaningful(&tokens[examine_range]).unwrap_or(fallback);

            Diagnostic::error(format!("unexpected token: {message}"))
                .with_code(ErrorCode::E100)
                .with_label(error_span, "unexpected token")
                .with_help("check syntax and token positioning")
        }
        ErrMode::Incomplete(_) => {
            let error_span = if end_offset < tokens.len() {
                tokens[end_offset].span
            } else {
                meaningful(tokens).unwrap_or(fallback)
            };

            Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(error_span, "incomplete")
                .with_help("ensure input is complete")
        }
    }
}

/// Build a unit from tokens
pub fn build_unit<'src>(tokens: &'src [PositionedToken<'src>]) -> Result<types::Unit, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    match unit.parse_next(&mut token_slice) {
        Ok(unit) => Ok(unit),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, tokens, current_remaining))
        }
    }
}
