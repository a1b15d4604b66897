//! Accumulates diagnostics across one pipeline phase.

use log::warn;

use crate::error::{Diagnostic, ParseError};

/// Collects every diagnostic a phase reports so that all problems in a
/// file surface together instead of one per run.
///
/// ```
/// # use lrc_parser::error::{Diagnostic, DiagnosticCollector, ErrorCode};
/// # use lrc_parser::Span;
/// let mut collector = DiagnosticCollector::new();
/// collector.emit(
///     Diagnostic::error("alias target `core.nope` is not declared")
///         .with_code(ErrorCode::E204)
///         .with_label(Span::new(6..15), "not found in package `core`"),
/// );
/// assert!(collector.finish().is_err());
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take everything collected so far, errors and warnings alike.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Close the phase.
    ///
    /// Fails with every collected diagnostic if any of them is an error.
    /// Otherwise the warnings are logged and dropped.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            return Err(ParseError::new(self.diagnostics));
        }
        for diagnostic in &self.diagnostics {
            warn!(diagnostic:%; "Compilation warning");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_collector_empty_finishes_ok() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_error_fails() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("unknown type `os.nope`"));
        assert!(collector.has_errors());
        assert!(collector.finish().is_err());
    }

    #[test]
    fn test_collector_warnings_only_succeeds() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("embedded field name collides"));
        collector.emit(Diagnostic::warning("unused init hook"));
        assert!(!collector.has_errors());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_collector_keeps_all_diagnostics() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(
            Diagnostic::error("package `core` is not imported")
                .with_code(ErrorCode::E203)
                .with_label(Span::new(10..20), "here"),
        );
        collector.emit(Diagnostic::warning("unused hook"));

        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert_eq!(err.diagnostics()[0].message(), "package `core` is not imported");
    }

    #[test]
    fn test_into_diagnostics() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("a"));
        collector.emit(Diagnostic::error("b"));
        let diagnostics = collector.into_diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[1].severity().is_error());
    }
}
