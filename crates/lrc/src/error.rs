//! Error types for LR compilation.
//!
//! This module provides the main error type [`LrcError`] which wraps the
//! error conditions that can occur while compiling an LR file.

use std::io;

use thiserror::Error;

use lrc_parser::error::ParseError;

/// The main error type for LR compilation.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic of the failed phase
/// (syntax, resolution, schema or code generation) together with the
/// source text, so callers can render labeled snippets.
#[derive(Debug, Error)]
pub enum LrcError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LrcError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
