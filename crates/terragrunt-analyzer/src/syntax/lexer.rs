use std::ops::Range;

use logos::Logos;

use crate::syntax::kind::{SyntaxKind, TokenKind};

/// A lexed token with its absolute byte span in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Range<usize>,
}

/// A lexer that wraps `logos::Lexer` to produce `SyntaxKind` tokens.
///
/// Quoted templates and heredocs are scanned by hand on top of logos because
/// their extent depends on nested `${ ... }` sequences and closing markers.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    base: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_offset(input, 0)
    }

    /// Lex a slice of a larger document; spans are shifted by `base`.
    pub fn with_offset(
        input: &'a str,
        base: usize,
    ) -> Self {
        Self {
            inner: TokenKind::lexer(input),
            base,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token_result = self.inner.next()?;

        let kind = match token_result {
            Ok(TokenKind::Quote) => {
                let (len, terminated) = scan_quoted(self.inner.remainder().as_bytes());
                self.inner.bump(len);
                if terminated {
                    SyntaxKind::String
                } else {
                    SyntaxKind::UnterminatedString
                }
            },
            Ok(TokenKind::HeredocStart) => {
                let marker = self.inner.slice().trim_start_matches('<').trim_start_matches('-').to_owned();
                let (len, terminated) = scan_heredoc(self.inner.remainder(), &marker);
                self.inner.bump(len);
                if terminated {
                    SyntaxKind::Heredoc
                } else {
                    SyntaxKind::UnterminatedHeredoc
                }
            },
            Ok(token) => token.into(),
            Err(_) => SyntaxKind::Error,
        };

        let span = self.inner.span();
        Some(Token {
            kind,
            span: span.start + self.base..span.end + self.base,
        })
    }
}

/// An open construct while scanning a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Quoted,
    Interpolation,
    Brace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanEnd {
    /// Index of the byte that closes the outermost frame.
    Closed(usize),
    /// The outermost quoted string reached a newline at this index.
    Newline(usize),
    /// Input ended with only the outermost frame open.
    EndOfInput,
    /// A nested string or interpolation was left open.
    NestedUnterminated,
}

/// Walk `bytes` from `start` until `outer` closes. Nested strings and
/// interpolations live on a heap stack, so deep nesting cannot exhaust the
/// call stack.
fn scan(
    bytes: &[u8],
    start: usize,
    outer: Frame,
) -> ScanEnd {
    let mut stack = vec![outer];
    let mut i = start;
    while let Some(&frame) = stack.last() {
        let Some(&byte) = bytes.get(i) else {
            break;
        };
        match frame {
            Frame::Quoted => match byte {
                b'\\' => {
                    i += 2;
                    continue;
                },
                b'"' => {
                    stack.pop();
                    if stack.is_empty() {
                        return ScanEnd::Closed(i);
                    }
                },
                b'\n' if stack.len() == 1 => return ScanEnd::Newline(i),
                b'\n' => return ScanEnd::NestedUnterminated,
                b'$' | b'%' if bytes.get(i + 1) == Some(&byte) && bytes.get(i + 2) == Some(&b'{') => {
                    i += 3;
                    continue;
                },
                b'$' | b'%' if bytes.get(i + 1) == Some(&b'{') => {
                    stack.push(Frame::Interpolation);
                    i += 2;
                    continue;
                },
                _ => {},
            },
            Frame::Interpolation | Frame::Brace => match byte {
                b'{' => stack.push(Frame::Brace),
                b'}' => {
                    stack.pop();
                    if stack.is_empty() {
                        return ScanEnd::Closed(i);
                    }
                },
                b'"' => stack.push(Frame::Quoted),
                _ => {},
            },
        }
        i += 1;
    }
    if stack.len() > 1 {
        ScanEnd::NestedUnterminated
    } else {
        ScanEnd::EndOfInput
    }
}

/// Scan the body of a quoted template that starts right after the opening
/// quote. Returns the consumed length (including the closing quote when
/// present) and whether the string was terminated.
///
/// An unterminated string stops before the first newline so that the rest
/// of the document still lexes normally.
pub(crate) fn scan_quoted(rest: &[u8]) -> (usize, bool) {
    match scan(rest, 0, Frame::Quoted) {
        ScanEnd::Closed(end) => (end + 1, true),
        ScanEnd::Newline(end) => (end, false),
        ScanEnd::EndOfInput => (rest.len(), false),
        ScanEnd::NestedUnterminated => (unterminated_len(rest), false),
    }
}

/// Find the index of the `}` closing an interpolation whose body starts at
/// `start`, skipping nested braces and nested quoted strings.
pub(crate) fn interpolation_end(
    bytes: &[u8],
    start: usize,
) -> Option<usize> {
    match scan(bytes, start, Frame::Interpolation) {
        ScanEnd::Closed(end) => Some(end),
        _ => None,
    }
}

fn unterminated_len(rest: &[u8]) -> usize {
    rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len())
}

/// Scan a heredoc body following `<<MARKER`. The body ends with the line
/// whose trimmed content equals the marker.
fn scan_heredoc(
    rest: &str,
    marker: &str,
) -> (usize, bool) {
    let Some(first_newline) = rest.find('\n') else {
        return (rest.len(), false);
    };
    let mut line_start = first_newline + 1;
    while line_start <= rest.len() {
        let line_end = rest[line_start..].find('\n').map(|i| line_start + i).unwrap_or(rest.len());
        if rest[line_start..line_end].trim() == marker {
            return (line_end, true);
        }
        if line_end == rest.len() {
            break;
        }
        line_start = line_end + 1;
    }
    (rest.len(), false)
}
