use std::collections::HashSet;

use tower_lsp::lsp_types::{self, DiagnosticSeverity, Position, Range};

use crate::syntax::{ErrorKind, ErrorLevel, ParseError};

/// Diagnostic severity, ordered so that `Error` sorts highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn to_lsp(self) -> DiagnosticSeverity {
        match self {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
            Severity::Info => DiagnosticSeverity::INFORMATION,
        }
    }
}

impl From<ErrorLevel> for Severity {
    fn from(level: ErrorLevel) -> Self {
        match level {
            ErrorLevel::Error => Severity::Error,
            ErrorLevel::Warning => Severity::Warning,
            ErrorLevel::Note => Severity::Info,
        }
    }
}

/// A diagnostic in protocol coordinates (0-based line, UTF-16 character).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub message: String,
    pub source: String,
}

impl Diagnostic {
    /// Convert into an LSP `Diagnostic`.
    pub fn into_lsp_diagnostic(self) -> lsp_types::Diagnostic {
        lsp_types::Diagnostic {
            range: self.range,
            severity: Some(self.severity.to_lsp()),
            code: None,
            code_description: None,
            source: Some(self.source),
            message: self.message,
            related_information: None,
            tags: None,
            data: None,
        }
    }
}

/// Turn decoder errors into the diagnostics an editor should show.
///
/// Errors about unavailable dependency outputs are dropped. The rest are
/// deduplicated on (range, message) and ordered by severity (errors first),
/// then by start position. The sort is stable, so equal keys keep decoder
/// order.
pub fn translate(
    errors: &[ParseError],
    source: &str,
) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut diagnostics: Vec<Diagnostic> = errors
        .iter()
        .filter(|error| error.kind != ErrorKind::DependencyUnresolved)
        .map(|error| Diagnostic {
            // Decoder positions are 1-based; the protocol is 0-based.
            range: Range::new(
                Position::new(error.start.line.saturating_sub(1), error.start.column.saturating_sub(1)),
                Position::new(error.end.line.saturating_sub(1), error.end.column.saturating_sub(1)),
            ),
            severity: error.level.into(),
            message: error.message.clone(),
            source: source.to_owned(),
        })
        .filter(|diag| seen.insert((range_key(&diag.range), diag.message.clone())))
        .collect();

    diagnostics.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| range_key(&a.range).0.cmp(&range_key(&b.range).0))
    });
    diagnostics
}

fn range_key(range: &Range) -> ((u32, u32), (u32, u32)) {
    (
        (range.start.line, range.start.character),
        (range.end.line, range.end.character),
    )
}

#[cfg(test)]
#[path = "../../tests/src/diagnostics/translate_tests.rs"]
mod tests;
