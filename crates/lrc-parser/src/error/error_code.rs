//! Error codes for LR diagnostics.
//!
//! Codes are grouped by the phase that reports them:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Import and alias resolution errors
//! - `E3xx` - Schema errors
//! - `E4xx` - Code generation errors

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    E001,

    /// Unexpected character.
    ///
    /// The character cannot start any LR token.
    E002,

    /// Invalid escape sequence inside a string literal.
    E003,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Incomplete input.
    E101,

    // =========================================================================
    // Resolution Errors (E2xx)
    // =========================================================================
    /// An imported file could not be read.
    E200,

    /// An imported file failed to parse.
    E201,

    /// An imported file does not declare the `rust_module` option.
    ///
    /// Generated code refers to imported resources through that module path.
    E202,

    /// An alias names a package that is not imported.
    E203,

    /// An alias names a resource its package does not declare.
    E204,

    /// An alias target is not package-qualified.
    E205,

    // =========================================================================
    // Schema Errors (E3xx)
    // =========================================================================
    /// An init argument's declared type differs from its field's type.
    E300,

    /// A required init argument follows an optional one.
    E301,

    /// An init argument has no type and no field to take one from.
    E302,

    /// A resource declares more than one initializer.
    E303,

    /// A resource is declared more than once.
    E304,

    // =========================================================================
    // Codegen Errors (E4xx)
    // =========================================================================
    /// A package-qualified type names a resource the package does not declare.
    E400,

    /// A type is neither a primitive nor a known resource.
    E401,

    /// A computed field depends on a field its resource does not declare.
    E402,

    /// Generated code uses a package whose `rust_module` option is blank.
    E403,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
            ErrorCode::E402 => "E402",
            ErrorCode::E403 => "E403",
        }
    }

    /// Short description used as the default label text.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E200 => "unreadable import",
            ErrorCode::E201 => "invalid import",
            ErrorCode::E202 => "missing module option",
            ErrorCode::E203 => "package not imported",
            ErrorCode::E204 => "unknown aliased resource",
            ErrorCode::E205 => "unqualified alias target",
            ErrorCode::E300 => "init argument type mismatch",
            ErrorCode::E301 => "required argument after optional",
            ErrorCode::E302 => "untyped init argument",
            ErrorCode::E303 => "multiple initializers",
            ErrorCode::E304 => "duplicate resource",
            ErrorCode::E400 => "unknown resource in package",
            ErrorCode::E401 => "unknown type",
            ErrorCode::E402 => "unknown dependency",
            ErrorCode::E403 => "package without module path",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
