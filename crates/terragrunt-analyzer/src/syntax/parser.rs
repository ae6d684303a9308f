use rowan::{Checkpoint, GreenNodeBuilder};

use crate::syntax::{
    ErrorKind, ErrorLevel, Report, SyntaxTree,
    ast::{Span, binary_operator},
    kind::SyntaxKind,
    lexer::{Lexer, Token, interpolation_end},
};

/// How deep expressions and blocks may nest before the rest of the construct
/// is kept as a single invalid node. Every consumer of the tree recurses, so
/// this also bounds evaluation and indexing.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Error-recovering recursive descent parser for the HCL native syntax.
///
/// The output is a lossless rowan tree: every byte of the input, trivia
/// included, ends up in exactly one token. Trivia is flushed before a node
/// starts, so node ranges never begin or end with whitespace.
///
/// Newlines terminate attributes, so they stay significant except inside
/// `(...)`, `[...]` or `{...}` expressions, where they are trivia.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    depth: usize,
    unclosed_reported: bool,
    reports: Vec<Report>,
    builder: GreenNodeBuilder<'static>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let tokens = with_eof(Lexer::new(source).collect(), source.len());
        Self {
            source,
            tokens,
            pos: 0,
            nesting: 0,
            depth: 0,
            unclosed_reported: false,
            reports: Vec::new(),
            builder: GreenNodeBuilder::new(),
        }
    }

    /// Parse a whole document. Never fails; problems are returned as reports
    /// next to the best-effort tree.
    pub fn parse(mut self) -> (SyntaxTree, Vec<Report>) {
        self.builder.start_node(SyntaxKind::Root.into());
        self.parse_body(false);
        self.eat_skipped();
        self.builder.finish_node();
        (SyntaxTree::new(self.builder.finish()), self.reports)
    }

    // ── token cursor ────────────────────────────────────────────────────

    fn is_skipped(
        &self,
        kind: SyntaxKind,
    ) -> bool {
        kind.is_trivia() || (self.nesting > 0 && kind == SyntaxKind::Newline)
    }

    /// Index of the `n`th significant token from the cursor.
    fn lookahead(
        &self,
        mut n: usize,
    ) -> usize {
        let mut i = self.pos;
        loop {
            while self.is_skipped(self.tokens[i].kind) {
                i += 1;
            }
            if n == 0 || self.tokens[i].kind == SyntaxKind::Eof {
                return i;
            }
            n -= 1;
            i += 1;
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.lookahead(0)]
    }

    fn peek(&self) -> SyntaxKind {
        self.current().kind
    }

    fn nth_kind(
        &self,
        n: usize,
    ) -> SyntaxKind {
        self.tokens[self.lookahead(n)].kind
    }

    /// Next token that is not whitespace or a comment. Unlike [`Self::peek`]
    /// a newline is returned even inside brackets.
    fn peek_raw(&self) -> SyntaxKind {
        self.tokens[self.pos..]
            .iter()
            .find(|token| !token.kind.is_trivia())
            .map_or(SyntaxKind::Eof, |token| token.kind)
    }

    fn peek_text(&self) -> &'a str {
        let source = self.source;
        &source[self.current().span.clone()]
    }

    fn at(
        &self,
        kind: SyntaxKind,
    ) -> bool {
        self.peek() == kind
    }

    fn at_keyword(
        &self,
        keyword: &str,
    ) -> bool {
        self.at(SyntaxKind::Ident) && self.peek_text() == keyword
    }

    /// Position of the next significant token; used to detect loops that
    /// stopped making progress.
    fn marker(&self) -> usize {
        self.lookahead(0)
    }

    fn push_token(
        &mut self,
        kind: SyntaxKind,
        span: Span,
    ) {
        let source = self.source;
        self.builder.token(kind.into(), &source[span]);
    }

    /// Move skipped tokens in front of the cursor into the tree.
    fn eat_skipped(&mut self) {
        while self.is_skipped(self.tokens[self.pos].kind) {
            let token = self.tokens[self.pos].clone();
            self.push_token(token.kind, token.span);
            self.pos += 1;
        }
    }

    fn bump(&mut self) -> Token {
        self.eat_skipped();
        let token = self.tokens[self.pos].clone();
        if token.kind != SyntaxKind::Eof {
            self.push_token(token.kind, token.span.clone());
            self.pos += 1;
        }
        token
    }

    /// Bump the current identifier as a keyword token.
    fn bump_keyword(
        &mut self,
        kind: SyntaxKind,
    ) {
        self.eat_skipped();
        let token = self.tokens[self.pos].clone();
        self.push_token(kind, token.span);
        self.pos += 1;
    }

    fn skip_newlines(&mut self) {
        while self.at(SyntaxKind::Newline) {
            self.bump();
        }
    }

    fn start_node(
        &mut self,
        kind: SyntaxKind,
    ) {
        self.eat_skipped();
        self.builder.start_node(kind.into());
    }

    fn start_node_at(
        &mut self,
        checkpoint: Checkpoint,
        kind: SyntaxKind,
    ) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.eat_skipped();
        self.builder.checkpoint()
    }

    // ── reporting ───────────────────────────────────────────────────────

    fn error(
        &mut self,
        span: Span,
        message: impl Into<String>,
    ) {
        // One report per token start keeps cascades out of the output.
        if self.reports.last().is_some_and(|r| r.span.start == span.start) {
            return;
        }
        if self.unclosed_reported && span.start == self.source.len() {
            return;
        }
        self.reports.push(Report {
            kind: ErrorKind::Syntax,
            level: ErrorLevel::Error,
            message: message.into(),
            span,
        });
    }

    fn error_at_current(
        &mut self,
        expected: &str,
    ) {
        let token = self.current().clone();
        let message = match token.kind {
            SyntaxKind::Error => "Invalid character".to_owned(),
            SyntaxKind::UnterminatedString => "Unterminated string literal".to_owned(),
            SyntaxKind::UnterminatedHeredoc => "Unterminated heredoc".to_owned(),
            found => format!("Expected {expected}, found {}", found.describe()),
        };
        let span = self.report_span(&token);
        self.error(span, message);
    }

    fn report_unclosed(
        &mut self,
        open: Span,
        what: &str,
    ) {
        if self.unclosed_reported {
            return;
        }
        self.unclosed_reported = true;
        self.reports.push(Report {
            kind: ErrorKind::Syntax,
            level: ErrorLevel::Error,
            message: format!("Unclosed {what}; expected a matching closing delimiter"),
            span: open,
        });
    }

    /// Heredoc tokens run to end of file when unterminated; only their
    /// opening marker is reported.
    fn report_span(
        &self,
        token: &Token,
    ) -> Span {
        if token.kind == SyntaxKind::UnterminatedHeredoc {
            let text = &self.source[token.span.clone()];
            let marker_len = text.find('\n').unwrap_or(text.len());
            return token.span.start..token.span.start + marker_len;
        }
        token.span.clone()
    }

    /// Skip the rest of the current line, leaving a closing `}` that belongs
    /// to an enclosing block in place.
    fn recover_line(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                SyntaxKind::Eof => return,
                SyntaxKind::Newline | SyntaxKind::RBrace if depth == 0 => return,
                SyntaxKind::LBrace | SyntaxKind::LBracket | SyntaxKind::LParen => depth += 1,
                SyntaxKind::RBrace | SyntaxKind::RBracket | SyntaxKind::RParen => depth = depth.saturating_sub(1),
                _ => {},
            }
            self.bump();
        }
    }

    /// Past [`MAX_NESTING_DEPTH`], keep the rest of the expression as one
    /// invalid node: everything up to the closer, comma or newline that ends
    /// it at the current level.
    fn skip_nested_expr(&mut self) {
        let token = self.current().clone();
        let span = self.report_span(&token);
        self.error(span, "Expression is nested too deeply");
        self.start_node(SyntaxKind::ErrorExpr);
        let mut depth = 0usize;
        loop {
            match self.peek() {
                SyntaxKind::Eof => break,
                SyntaxKind::Comma | SyntaxKind::Newline if depth == 0 => break,
                SyntaxKind::RBrace | SyntaxKind::RBracket | SyntaxKind::RParen if depth == 0 => break,
                SyntaxKind::LBrace | SyntaxKind::LBracket | SyntaxKind::LParen => depth += 1,
                SyntaxKind::RBrace | SyntaxKind::RBracket | SyntaxKind::RParen => depth -= 1,
                _ => {},
            }
            self.bump();
        }
        self.finish_node();
    }

    // ── bodies ──────────────────────────────────────────────────────────

    fn parse_body(
        &mut self,
        in_block: bool,
    ) {
        loop {
            self.skip_newlines();
            match self.peek() {
                SyntaxKind::Eof => break,
                SyntaxKind::RBrace if in_block => break,
                SyntaxKind::RBrace => {
                    let span = self.bump().span;
                    self.error(span, "Unexpected `}` outside of a block");
                },
                SyntaxKind::Ident => self.parse_structure(),
                _ => {
                    self.error_at_current("an attribute or block");
                    self.bump();
                    self.recover_line();
                },
            }
        }
    }

    fn parse_structure(&mut self) {
        let reports_before = self.reports.len();
        let checkpoint = self.checkpoint();
        let name = self.bump();

        if self.at(SyntaxKind::Equal) {
            self.start_node_at(checkpoint, SyntaxKind::Attribute);
            self.bump();
            self.parse_expr();
            self.finish_node();
            self.expect_line_end(reports_before);
            return;
        }

        if self.starts_block() {
            self.parse_block(checkpoint, reports_before);
            return;
        }

        match self.peek() {
            SyntaxKind::Newline | SyntaxKind::Eof | SyntaxKind::RBrace => {
                let text = &self.source[name.span.clone()];
                self.error(name.span.clone(), format!("Expected `=` or `{{` after `{text}`"));
            },
            kind => {
                // Missing `=`: the first token after the name is the offender,
                // and the rest of the line is kept as the value. An attribute
                // without `=` is what marks it as recovered.
                self.error_at_current("`=` or `{`");
                if !can_start_expr(kind) {
                    self.bump();
                    self.recover_line();
                    return;
                }
                self.start_node_at(checkpoint, SyntaxKind::Attribute);
                self.parse_expr();
                self.finish_node();
                self.expect_line_end(reports_before);
            },
        }
    }

    /// Labels (quoted or bare) followed by `{`.
    fn starts_block(&self) -> bool {
        let mut n = 0;
        loop {
            match self.nth_kind(n) {
                SyntaxKind::String | SyntaxKind::Ident => n += 1,
                SyntaxKind::LBrace => return true,
                _ => return false,
            }
        }
    }

    fn parse_block(
        &mut self,
        checkpoint: Checkpoint,
        reports_before: usize,
    ) {
        self.start_node_at(checkpoint, SyntaxKind::Block);
        while matches!(self.peek(), SyntaxKind::String | SyntaxKind::Ident) {
            self.bump();
        }

        self.start_node(SyntaxKind::BlockBody);
        let open_brace = self.bump().span;
        if self.depth >= MAX_NESTING_DEPTH {
            self.error(open_brace, "Block is nested too deeply");
            self.skip_to_matching_closer();
            self.finish_node();
            self.finish_node();
            self.expect_line_end(reports_before);
            return;
        }

        self.depth += 1;
        self.parse_body(true);
        self.depth -= 1;
        let closed = if self.at(SyntaxKind::RBrace) {
            self.bump();
            true
        } else {
            self.report_unclosed(open_brace, "block");
            false
        };
        self.finish_node();
        self.finish_node();
        if closed {
            self.expect_line_end(reports_before);
        }
    }

    /// Consume tokens through the closer that matches an opener the cursor
    /// has just passed.
    fn skip_to_matching_closer(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                SyntaxKind::Eof => return,
                SyntaxKind::LBrace | SyntaxKind::LBracket | SyntaxKind::LParen => depth += 1,
                SyntaxKind::RBrace | SyntaxKind::RBracket | SyntaxKind::RParen => {
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                    depth -= 1;
                },
                _ => {},
            }
            self.bump();
        }
    }

    fn expect_line_end(
        &mut self,
        reports_before: usize,
    ) {
        match self.peek() {
            SyntaxKind::Newline | SyntaxKind::Eof | SyntaxKind::RBrace => {},
            _ => {
                if self.reports.len() == reports_before {
                    self.error_at_current("a newline");
                }
                self.recover_line();
            },
        }
    }

    fn expect_closer(
        &mut self,
        closer: SyntaxKind,
        open: Span,
        what: &str,
    ) {
        if self.at(closer) {
            self.bump();
            return;
        }
        if self.at(SyntaxKind::Eof) {
            self.report_unclosed(open, what);
            return;
        }
        self.error_at_current(closer.describe());
        let mut depth = 0usize;
        loop {
            match self.peek() {
                SyntaxKind::Eof => return,
                kind if kind == closer && depth == 0 => {
                    self.bump();
                    return;
                },
                SyntaxKind::LBrace | SyntaxKind::LBracket | SyntaxKind::LParen => depth += 1,
                SyntaxKind::RBrace | SyntaxKind::RBracket | SyntaxKind::RParen => depth = depth.saturating_sub(1),
                _ => {},
            }
            self.bump();
        }
    }

    // ── expressions ─────────────────────────────────────────────────────

    fn parse_expr(&mut self) {
        if self.depth >= MAX_NESTING_DEPTH {
            self.skip_nested_expr();
            return;
        }
        self.depth += 1;
        self.parse_conditional();
        self.depth -= 1;
    }

    fn parse_conditional(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_binary(1);
        if !self.at(SyntaxKind::Question) {
            return;
        }
        self.start_node_at(checkpoint, SyntaxKind::ConditionalExpr);
        self.bump();
        self.parse_expr();
        if self.at(SyntaxKind::Colon) {
            self.bump();
        } else {
            self.error_at_current("`:` in conditional expression");
        }
        self.parse_expr();
        self.finish_node();
    }

    fn parse_binary(
        &mut self,
        min_precedence: u8,
    ) {
        let checkpoint = self.checkpoint();
        self.parse_unary();
        let depth = self.depth;
        while let Some(op) = binary_operator(self.peek()) {
            if op.precedence() < min_precedence {
                break;
            }
            // Each operator wraps everything parsed so far one level deeper.
            self.depth += 1;
            self.start_node_at(checkpoint, SyntaxKind::BinaryExpr);
            self.bump();
            if self.depth >= MAX_NESTING_DEPTH {
                self.skip_nested_expr();
            } else {
                self.parse_binary(op.precedence() + 1);
            }
            self.finish_node();
        }
        self.depth = depth;
    }

    fn parse_unary(&mut self) {
        if !matches!(self.peek(), SyntaxKind::Exclaim | SyntaxKind::Minus) {
            self.parse_postfix();
            return;
        }
        if self.depth >= MAX_NESTING_DEPTH {
            self.skip_nested_expr();
            return;
        }
        self.depth += 1;
        self.start_node(SyntaxKind::UnaryExpr);
        self.bump();
        self.parse_unary();
        self.finish_node();
        self.depth -= 1;
    }

    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_primary();
        let mut traversal = false;

        loop {
            if !matches!(self.peek(), SyntaxKind::Dot | SyntaxKind::LBracket) {
                break;
            }
            if !traversal {
                self.start_node_at(checkpoint, SyntaxKind::TraversalExpr);
                traversal = true;
            }
            let operator = self.checkpoint();
            if self.at(SyntaxKind::Dot) {
                self.bump();
                match self.peek() {
                    SyntaxKind::Ident => {
                        self.start_node_at(operator, SyntaxKind::GetAttr);
                        self.bump();
                    },
                    SyntaxKind::Number => {
                        self.start_node_at(operator, SyntaxKind::LegacyIndex);
                        let token = self.bump();
                        self.check_legacy_indices(&token);
                    },
                    SyntaxKind::Star => {
                        self.start_node_at(operator, SyntaxKind::AttrSplat);
                        self.bump();
                    },
                    _ => {
                        self.start_node_at(operator, SyntaxKind::GetAttr);
                        self.finish_node();
                        self.error_at_current("an attribute name after `.`");
                        break;
                    },
                }
                self.finish_node();
                continue;
            }

            let open = self.bump().span;
            self.nesting += 1;
            if self.at(SyntaxKind::Star) && self.nth_kind(1) == SyntaxKind::RBracket {
                self.start_node_at(operator, SyntaxKind::FullSplat);
                self.bump();
                self.bump();
            } else {
                self.start_node_at(operator, SyntaxKind::IndexOp);
                self.parse_expr();
                self.expect_closer(SyntaxKind::RBracket, open, "index");
            }
            self.nesting -= 1;
            self.finish_node();
        }

        if traversal {
            self.finish_node();
        }
    }

    /// `a.0.1` lexes the indices as a single number token; each part must be
    /// an integer.
    fn check_legacy_indices(
        &mut self,
        token: &Token,
    ) {
        let text = &self.source[token.span.clone()];
        let mut offset = token.span.start;
        for part in text.split('.') {
            let span = offset..offset + part.len();
            if part.parse::<u64>().is_err() {
                self.error(span, "Expected an integer index");
            }
            offset += part.len() + 1;
        }
    }

    fn parse_primary(&mut self) {
        let token = self.current().clone();
        match token.kind {
            SyntaxKind::Number => {
                self.start_node(SyntaxKind::LiteralExpr);
                self.bump();
                self.finish_node();
            },
            SyntaxKind::Ident => self.parse_ident_expr(),
            SyntaxKind::String => {
                self.start_node(SyntaxKind::TemplateExpr);
                self.pos += 1;
                self.split_template(&token);
                self.finish_node();
            },
            SyntaxKind::Heredoc => {
                self.start_node(SyntaxKind::TemplateExpr);
                self.bump();
                self.finish_node();
            },
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::ParenExpr);
                self.bump();
                self.nesting += 1;
                self.parse_expr();
                self.expect_closer(SyntaxKind::RParen, token.span, "parenthesis");
                self.nesting -= 1;
                self.finish_node();
            },
            SyntaxKind::LBracket => self.parse_tuple(),
            SyntaxKind::LBrace => self.parse_object(),
            _ => {
                self.error_at_current("an expression");
                self.start_node(SyntaxKind::ErrorExpr);
                if matches!(
                    token.kind,
                    SyntaxKind::Error | SyntaxKind::UnterminatedString | SyntaxKind::UnterminatedHeredoc
                ) {
                    self.bump();
                }
                self.finish_node();
            },
        }
    }

    fn parse_ident_expr(&mut self) {
        let checkpoint = self.checkpoint();
        let text = self.peek_text();
        self.bump();
        let kind = if matches!(text, "true" | "false" | "null") {
            SyntaxKind::LiteralExpr
        } else if self.peek_raw() == SyntaxKind::LParen {
            SyntaxKind::FuncCallExpr
        } else {
            SyntaxKind::VariableExpr
        };
        self.start_node_at(checkpoint, kind);
        if kind == SyntaxKind::FuncCallExpr {
            self.parse_call_args();
        }
        self.finish_node();
    }

    fn parse_call_args(&mut self) {
        let open = self.bump().span;
        self.nesting += 1;
        while !matches!(self.peek(), SyntaxKind::RParen | SyntaxKind::Eof) {
            self.parse_expr();
            if self.at(SyntaxKind::Ellipsis) {
                self.bump();
            }
            if self.at(SyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_closer(SyntaxKind::RParen, open, "function call");
        self.nesting -= 1;
    }

    fn parse_tuple(&mut self) {
        let checkpoint = self.checkpoint();
        let open = self.bump().span;
        self.nesting += 1;
        if self.at_keyword("for") {
            self.start_node_at(checkpoint, SyntaxKind::ForExpr);
            self.parse_for(false);
        } else {
            self.start_node_at(checkpoint, SyntaxKind::TupleExpr);
            while !matches!(self.peek(), SyntaxKind::RBracket | SyntaxKind::Eof) {
                let before = self.marker();
                self.parse_expr();
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else if self.marker() == before {
                    break;
                }
            }
        }
        self.expect_closer(SyntaxKind::RBracket, open, "tuple");
        self.nesting -= 1;
        self.finish_node();
    }

    fn parse_object(&mut self) {
        let checkpoint = self.checkpoint();
        let open = self.bump().span;
        self.nesting += 1;
        if self.at_keyword("for") {
            self.start_node_at(checkpoint, SyntaxKind::ForExpr);
            self.parse_for(true);
        } else {
            self.start_node_at(checkpoint, SyntaxKind::ObjectExpr);
            while !matches!(self.peek(), SyntaxKind::RBrace | SyntaxKind::Eof) {
                let before = self.marker();
                self.start_node(SyntaxKind::ObjectItem);
                self.parse_expr();
                if !matches!(self.peek(), SyntaxKind::Equal | SyntaxKind::Colon) {
                    self.error_at_current("`=` or `:` after object key");
                    if self.marker() == before {
                        self.bump();
                    }
                    self.finish_node();
                    continue;
                }
                self.bump();
                self.parse_expr();
                self.finish_node();
                if self.at(SyntaxKind::Comma) {
                    self.bump();
                } else if self.marker() == before {
                    break;
                }
            }
        }
        self.expect_closer(SyntaxKind::RBrace, open, "object");
        self.nesting -= 1;
        self.finish_node();
    }

    fn parse_for(
        &mut self,
        object: bool,
    ) {
        self.bump_keyword(SyntaxKind::ForKw);
        self.expect_ident("iterator name after `for`");
        if self.at(SyntaxKind::Comma) {
            self.bump();
            self.expect_ident("value iterator name");
        }

        if self.at_keyword("in") {
            self.bump_keyword(SyntaxKind::InKw);
        } else {
            self.error_at_current("`in`");
        }
        self.parse_expr();
        if self.at(SyntaxKind::Colon) {
            self.bump();
        } else {
            self.error_at_current("`:`");
        }

        self.parse_expr();
        if object {
            if self.at(SyntaxKind::FatArrow) {
                self.bump();
            } else {
                self.error_at_current("`=>`");
            }
            self.parse_expr();
            if self.at(SyntaxKind::Ellipsis) {
                self.bump();
            }
        }

        if self.at_keyword("if") {
            self.bump_keyword(SyntaxKind::IfKw);
            self.parse_expr();
        }
    }

    fn expect_ident(
        &mut self,
        what: &str,
    ) {
        if self.at(SyntaxKind::Ident) {
            self.bump();
        } else {
            self.error_at_current(what);
        }
    }

    // ── templates ───────────────────────────────────────────────────────

    /// Split a terminated quoted string into quote, literal, directive and
    /// interpolation pieces. Interpolations are parsed in place, so their
    /// nodes carry absolute spans.
    fn split_template(
        &mut self,
        token: &Token,
    ) {
        let source = self.source;
        let bytes = source.as_bytes();
        let open_quote = token.span.start;
        let inner_start = open_quote + 1;
        let inner_end = token.span.end.saturating_sub(1).max(inner_start);
        self.push_token(SyntaxKind::TemplateQuote, open_quote..inner_start);

        let mut literal_start = inner_start;
        let mut i = inner_start;
        while i < inner_end {
            match bytes[i] {
                b'\\' => i = (i + 2).min(inner_end),
                b'$' | b'%' if bytes.get(i + 1) == Some(&bytes[i]) && bytes.get(i + 2) == Some(&b'{') => i += 3,
                b'$' | b'%' if bytes.get(i + 1) == Some(&b'{') => {
                    let Some(close) = interpolation_end(&bytes[..inner_end], i + 2) else {
                        break;
                    };
                    self.push_literal(literal_start..i);
                    if bytes[i] == b'%' {
                        self.push_token(SyntaxKind::TemplateDirective, i..close + 1);
                    } else {
                        self.parse_interpolation(i, close);
                    }
                    i = close + 1;
                    literal_start = i;
                },
                _ => i += 1,
            }
        }
        self.push_literal(literal_start..inner_end);
        if token.span.end > inner_end {
            self.push_token(SyntaxKind::TemplateQuote, inner_end..token.span.end);
        }
    }

    fn push_literal(
        &mut self,
        span: Span,
    ) {
        if !span.is_empty() {
            self.push_token(SyntaxKind::TemplateLiteral, span);
        }
    }

    /// Parse `${ ... }` from `open` (the `$`) to `close` (the `}`) by
    /// swapping in the tokens of its body.
    fn parse_interpolation(
        &mut self,
        open: usize,
        close: usize,
    ) {
        let source = self.source;
        self.builder.start_node(SyntaxKind::Interpolation.into());
        self.push_token(SyntaxKind::TemplateInterpolationStart, open..open + 2);

        // Strip markers `${~ ... ~}` only affect whitespace.
        let mut start = open + 2;
        let mut end = close;
        if source[start..end].starts_with('~') {
            self.push_token(SyntaxKind::TemplateStrip, start..start + 1);
            start += 1;
        }
        let strip_end = source[start..end].ends_with('~');
        if strip_end {
            end -= 1;
        }

        let tokens = with_eof(Lexer::with_offset(&source[start..end], start).collect(), end);
        let outer_tokens = std::mem::replace(&mut self.tokens, tokens);
        let outer_pos = std::mem::replace(&mut self.pos, 0);
        let outer_nesting = std::mem::replace(&mut self.nesting, 1);
        let outer_unclosed = std::mem::replace(&mut self.unclosed_reported, false);

        if self.at(SyntaxKind::Eof) {
            self.error(open..close + 1, "Empty interpolation");
            self.start_node(SyntaxKind::ErrorExpr);
            self.finish_node();
        } else {
            self.parse_expr();
            if !self.at(SyntaxKind::Eof) {
                self.error_at_current("end of interpolation");
                self.start_node(SyntaxKind::ErrorExpr);
                while !self.at(SyntaxKind::Eof) {
                    self.bump();
                }
                self.finish_node();
            }
        }
        self.eat_skipped();

        self.tokens = outer_tokens;
        self.pos = outer_pos;
        self.nesting = outer_nesting;
        self.unclosed_reported = outer_unclosed;

        if strip_end {
            self.push_token(SyntaxKind::TemplateStrip, end..end + 1);
        }
        self.push_token(SyntaxKind::RBrace, close..close + 1);
        self.builder.finish_node();
    }
}

fn with_eof(
    mut tokens: Vec<Token>,
    end: usize,
) -> Vec<Token> {
    tokens.push(Token {
        kind: SyntaxKind::Eof,
        span: end..end,
    });
    tokens
}

fn can_start_expr(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Ident
            | SyntaxKind::Number
            | SyntaxKind::String
            | SyntaxKind::Heredoc
            | SyntaxKind::LParen
            | SyntaxKind::LBracket
            | SyntaxKind::LBrace
            | SyntaxKind::Exclaim
            | SyntaxKind::Minus
    )
}

#[cfg(test)]
#[path = "../../tests/src/syntax/parser_tests.rs"]
mod tests;
