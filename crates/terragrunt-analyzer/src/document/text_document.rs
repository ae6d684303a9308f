use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Url};

use crate::{analysis::ParseResult, text_pos::LineIndex};

// ── DocumentState ───────────────────────────────────────────────────────────

/// Where a document is in its parse cycle.
///
/// `Unopened` is represented by the document's absence from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// An accepted edit has not been parsed yet.
    Parsing,
    /// Last parse completed without error diagnostics.
    Ready,
    /// Last parse completed with error diagnostics.
    Error,
    /// The parse of the current version ran out of time; the next edit
    /// retries.
    TimedOut,
}

// ── Document ────────────────────────────────────────────────────────────────

/// Snapshot of a single open configuration buffer.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document URI.
    pub uri: Url,
    /// Full source text.
    pub text: Arc<str>,
    /// Document version as reported by the client.
    pub version: i32,
    pub state: DocumentState,
    /// Most recent committed parse. Its `version_parsed` never exceeds
    /// `version`.
    pub last_good_parse: Option<Arc<ParseResult>>,
    line_index: LineIndex,
}

impl Document {
    pub fn new(
        uri: Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> Self {
        let text = text.into();
        Self {
            uri,
            line_index: LineIndex::new(Arc::clone(&text)),
            text,
            version,
            state: DocumentState::Parsing,
            last_good_parse: None,
        }
    }

    // ── queries ─────────────────────────────────────────────────────────

    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    /// Convert an LSP `Position` (line/character, 0-based) to a byte offset.
    pub fn offset_of(
        &self,
        pos: Position,
    ) -> Option<usize> {
        self.line_index.offset_of(pos)
    }

    /// Convert a byte offset to an LSP `Position`.
    pub fn position_of(
        &self,
        offset: usize,
    ) -> Position {
        self.line_index.position_of(offset)
    }

    /// True when the committed parse belongs to the current text.
    pub fn is_settled(&self) -> bool {
        self.last_good_parse.as_ref().is_some_and(|parse| parse.version_parsed == self.version)
    }

    // ── mutations ───────────────────────────────────────────────────────

    /// Replace the full content and bump version. The committed parse is
    /// kept until a newer one replaces it.
    pub fn set_content(
        &mut self,
        text: impl Into<Arc<str>>,
        version: i32,
    ) {
        self.text = text.into();
        self.version = version;
        self.line_index = LineIndex::new(Arc::clone(&self.text));
        self.state = DocumentState::Parsing;
    }

    pub fn commit(
        &mut self,
        parse: Arc<ParseResult>,
    ) {
        self.state = if parse.has_errors() {
            DocumentState::Error
        } else {
            DocumentState::Ready
        };
        self.last_good_parse = Some(parse);
    }

    pub fn mark_timed_out(&mut self) {
        self.state = DocumentState::TimedOut;
    }
}

#[cfg(test)]
#[path = "../../tests/src/document/text_document_tests.rs"]
mod tests;
