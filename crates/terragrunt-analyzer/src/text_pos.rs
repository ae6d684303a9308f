use std::{ops::Range as Span, sync::Arc};

use tower_lsp::lsp_types::{Position, Range};

/// Line-start table over an immutable text, converting between byte offsets
/// and LSP positions (0-based line, UTF-16 character).
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: Arc<str>) -> Self {
        let mut line_starts = vec![0usize];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            text,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert an LSP `Position` to a byte offset.
    ///
    /// Characters past the end of the line clamp to the line end.
    pub fn offset_of(
        &self,
        position: Position,
    ) -> Option<usize> {
        let line = position.line as usize;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self.line_end(line);

        let mut utf16_offset: u32 = 0;
        let mut byte_offset = line_start;
        for ch in self.text[line_start..line_end].chars() {
            if utf16_offset >= position.character {
                break;
            }
            utf16_offset += ch.len_utf16() as u32;
            byte_offset += ch.len_utf8();
        }
        Some(byte_offset)
    }

    /// Convert a byte offset to an LSP `Position`.
    pub fn position_of(
        &self,
        offset: usize,
    ) -> Position {
        let offset = floor_char_boundary(&self.text, offset.min(self.text.len()));
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(ins) => ins.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let character = utf16_column_of_byte_offset(&self.text[line_start..], offset - line_start);
        Position::new(line as u32, character)
    }

    pub fn range_of(
        &self,
        span: &Span<usize>,
    ) -> Range {
        Range::new(self.position_of(span.start), self.position_of(span.end))
    }

    fn line_end(
        &self,
        line: usize,
    ) -> usize {
        let end = self.line_starts.get(line + 1).copied().unwrap_or(self.text.len());
        let slice = &self.text[..end];
        if slice.ends_with("\r\n") {
            end - 2
        } else if slice.ends_with('\n') {
            end - 1
        } else {
            end
        }
    }
}

pub fn utf16_column_of_byte_offset(
    line: &str,
    byte_offset: usize,
) -> u32 {
    line[..byte_offset.min(line.len())].encode_utf16().count() as u32
}

fn floor_char_boundary(
    text: &str,
    mut offset: usize,
) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
