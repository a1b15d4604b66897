//! Diagnostics for the LR toolchain.
//!
//! Every phase (lexing, parsing, resolution, schema extraction and code
//! generation) reports problems as [`Diagnostic`]s carrying an
//! [`ErrorCode`], labeled source spans and optional help. A phase that
//! reports at least one error fails with a [`ParseError`] holding all of
//! them.
//!
//! ```
//! # use lrc_parser::error::{Diagnostic, ErrorCode};
//! # use lrc_parser::Span;
//! let diag = Diagnostic::error("init argument `path` does not match its field type")
//!     .with_code(ErrorCode::E300)
//!     .with_label(Span::new(14..17), "declared as int")
//!     .with_secondary_label(Span::new(30..36), "field `path` is string")
//!     .with_help("drop the type from the init argument to reuse the field type");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use parse_error::Result;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
