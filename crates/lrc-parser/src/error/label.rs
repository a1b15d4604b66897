//! Labeled source spans attached to diagnostics.

use crate::span::Span;

/// A message pinned to a span of LR source.
///
/// A diagnostic carries one primary label marking where the problem is and
/// any number of secondary labels pointing at related declarations:
///
/// ```text
/// error[E300]: init argument `path` does not match its field type
///   --> os.lr:3:13
///    |
///  3 |   init(path int)
///    |             ^^^ declared as int here
///  4 |   path string
///    |        ------ field declared as string
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
