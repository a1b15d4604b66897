//! # LRC Parser
//!
//! Parser for the LR resource definition language. This crate turns LR
//! source text into a syntax tree and resolves its imports and aliases.
//!
//! ## Usage
//!
//! ```
//! # use lrc_parser::{parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         // A file on disk
//!         os.file {
//!           init(path string)
//!           path string
//!           size() int
//!         }
//!     "#;
//!
//!     let unit = parse(source)?;
//!     assert_eq!(unit.resources[0].docs.title, "A file on disk");
//!     Ok(())
//! }
//! ```

mod desugar;
pub mod error;
mod lexer;
mod parser;
mod parser_types;
pub mod resolve;
mod span;
mod tokens;

use log::{debug, info};

pub use desugar::LIST_FIELD;
pub use error::{Diagnostic, ErrorCode, ParseError};
pub use resolve::{FsLoader, ResolvedUnit, SourceLoader};
pub use span::{Span, Spanned};

/// Syntax tree types.
pub mod ast {
    pub use crate::parser_types::{
        Alias, BasicField, Docs, Embed, Field, FieldKind, Init, ListType, Resource, TypeExpr,
        TypedArg, Unit,
    };
}

/// Parse LR source text into a cleaned-up syntax tree.
///
/// The pipeline:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build the syntax tree from tokens
/// 3. **Desugar** - Split comments into docs, add `list` fields and
///    rewrite embeds
///
/// Imports are not read; see [`parse_and_resolve`].
pub fn parse(source: &str) -> Result<ast::Unit, ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;
    debug!(tokens = tokens.len(); "Tokenized source");

    // Step 2: Parse
    let unit = parser::build_unit(&tokens)?;

    // Step 3: Desugar
    Ok(desugar::desugar(unit))
}

/// Parse LR source text and resolve its imports through `loader`.
///
/// # Example
///
/// ```
/// # use lrc_parser::{parse_and_resolve, ParseError};
/// # use std::io;
///
/// fn main() -> Result<(), ParseError> {
///     let loader = |path: &str| -> io::Result<String> {
///         assert_eq!(path, "core.lr");
///         Ok("option rust_module = \"crate::core\"\nuser { name string }\n".to_string())
///     };
///     let source = "import \"core.lr\"\nalias owner = core.user\nos.file { owner() owner }\n";
///
///     let resolved = parse_and_resolve(source, &loader)?;
///     assert_eq!(resolved.alias("owner").unwrap().resource, "user");
///     Ok(())
/// }
/// ```
pub fn parse_and_resolve(
    source: &str,
    loader: &dyn SourceLoader,
) -> Result<ResolvedUnit, ParseError> {
    let unit = parse(source)?;
    info!(resources = unit.resources.len(); "Parsed unit");
    resolve::resolve(unit, loader)
}
