//! Typed views over the concrete syntax tree.
//!
//! Every wrapper holds a [`SyntaxNode`] and reads its parts on demand, so
//! spans are always the node's own text range in the document. Constructs
//! that failed to parse are kept as [`ErrorExpr`] so the rest of the tree
//! stays usable for indexing.

use std::ops::Range;

use rowan::NodeOrToken;

use crate::syntax::{
    cst::{SyntaxNode, SyntaxToken},
    kind::SyntaxKind,
};

pub type Span = Range<usize>;

pub trait AstNode: Sized {
    fn cast(syntax: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;

    fn span(&self) -> Span {
        node_span(self.syntax())
    }
}

macro_rules! ast_node {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct $name {
                syntax: SyntaxNode,
            }

            impl AstNode for $name {
                fn cast(syntax: SyntaxNode) -> Option<Self> {
                    if syntax.kind() == SyntaxKind::$kind {
                        Some(Self { syntax })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &SyntaxNode {
                    &self.syntax
                }
            }
        )*
    };
}

ast_node! {
    Attribute => Attribute,
    Block => Block,
    LiteralExpr => LiteralExpr,
    TemplateExpr => TemplateExpr,
    VariableExpr => VariableExpr,
    TraversalExpr => TraversalExpr,
    FuncCallExpr => FuncCallExpr,
    TupleExpr => TupleExpr,
    ObjectExpr => ObjectExpr,
    ObjectItem => ObjectItem,
    UnaryExpr => UnaryExpr,
    BinaryExpr => BinaryExpr,
    ConditionalExpr => ConditionalExpr,
    ForExpr => ForExpr,
    ParenExpr => ParenExpr,
    ErrorExpr => ErrorExpr,
}

fn node_span(node: &SyntaxNode) -> Span {
    let range = node.text_range();
    range.start().into()..range.end().into()
}

fn token_span(token: &SyntaxToken) -> Span {
    let range = token.text_range();
    range.start().into()..range.end().into()
}

fn direct_tokens(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> + use<> {
    node.children_with_tokens().filter_map(|element| element.into_token())
}

fn first_ident_token(node: &SyntaxNode) -> Option<SyntaxToken> {
    direct_tokens(node).find(|token| token.kind() == SyntaxKind::Ident)
}

fn has_token(
    node: &SyntaxNode,
    kind: SyntaxKind,
) -> bool {
    direct_tokens(node).any(|token| token.kind() == kind)
}

fn child_exprs(node: &SyntaxNode) -> impl Iterator<Item = Expr> + use<> {
    node.children().filter_map(Expr::cast)
}

// ── bodies ──────────────────────────────────────────────────────────────

/// The items of a document or of a block between its braces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Body {
    syntax: SyntaxNode,
}

impl AstNode for Body {
    fn cast(syntax: SyntaxNode) -> Option<Self> {
        if matches!(syntax.kind(), SyntaxKind::Root | SyntaxKind::BlockBody) {
            Some(Self { syntax })
        } else {
            None
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }
}

impl Body {
    pub(crate) fn from_root(syntax: SyntaxNode) -> Self {
        Self { syntax }
    }

    pub fn items(&self) -> impl Iterator<Item = Structure> + use<> {
        self.syntax.children().filter_map(Structure::cast)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        self.syntax.children().filter_map(Attribute::cast)
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + use<> {
        self.syntax.children().filter_map(Block::cast)
    }

    pub fn get_attribute(
        &self,
        key: &str,
    ) -> Option<Attribute> {
        self.attributes().find(|attr| attr.key().name == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Structure {
    Attribute(Attribute),
    Block(Block),
}

impl AstNode for Structure {
    fn cast(syntax: SyntaxNode) -> Option<Self> {
        match syntax.kind() {
            SyntaxKind::Attribute => Some(Structure::Attribute(Attribute { syntax })),
            SyntaxKind::Block => Some(Structure::Block(Block { syntax })),
            _ => None,
        }
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Structure::Attribute(attr) => attr.syntax(),
            Structure::Block(block) => block.syntax(),
        }
    }
}

/// A name read out of the tree. Missing names are empty and zero-width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    fn from_token(token: &SyntaxToken) -> Self {
        Self {
            name: token.text().to_owned(),
            span: token_span(token),
        }
    }

    fn missing(at: usize) -> Self {
        Self {
            name: String::new(),
            span: at..at,
        }
    }
}

impl Attribute {
    pub fn key(&self) -> Ident {
        first_ident_token(&self.syntax)
            .map_or_else(|| Ident::missing(self.span().start), |token| Ident::from_token(&token))
    }

    pub fn value(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    /// The parser kept this attribute although its `=` was missing. Its value
    /// is whatever followed the key on the same line.
    pub fn is_recovered(&self) -> bool {
        !has_token(&self.syntax, SyntaxKind::Equal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub value: String,
    pub span: Span,
}

impl Block {
    pub fn ident(&self) -> Ident {
        first_ident_token(&self.syntax)
            .map_or_else(|| Ident::missing(self.span().start), |token| Ident::from_token(&token))
    }

    pub fn labels(&self) -> Vec<Label> {
        direct_tokens(&self.syntax)
            .skip(1)
            .filter_map(|token| {
                let value = match token.kind() {
                    SyntaxKind::String => unquote(token.text()),
                    SyntaxKind::Ident => token.text().to_owned(),
                    _ => return None,
                };
                Some(Label {
                    value,
                    span: token_span(&token),
                })
            })
            .collect()
    }

    pub fn first_label(&self) -> Option<String> {
        self.labels().into_iter().next().map(|label| label.value)
    }

    /// Span of `type "label" ...`, the part of the block that names it.
    pub fn header_span(&self) -> Span {
        let ident = self.ident();
        let end = self.labels().last().map_or(ident.span.end, |label| label.span.end);
        ident.span.start..end
    }

    /// Display form of the header, e.g. `dependency "vpc"`.
    pub fn header_text(&self) -> String {
        let mut text = self.ident().name;
        for label in self.labels() {
            text.push_str(&format!(" \"{}\"", label.value));
        }
        text
    }

    pub fn body(&self) -> Option<Body> {
        self.syntax.children().find_map(Body::cast)
    }

    pub fn items(&self) -> impl Iterator<Item = Structure> + use<> {
        self.body().into_iter().flat_map(|body| body.items())
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        self.body().into_iter().flat_map(|body| body.attributes())
    }

    pub fn get_attribute(
        &self,
        key: &str,
    ) -> Option<Attribute> {
        self.body()?.get_attribute(key)
    }

    /// Whether the body ends with its closing `}`.
    pub fn is_closed(&self) -> bool {
        self.body().is_some_and(|body| {
            direct_tokens(&body.syntax)
                .filter(|token| !token.kind().is_trivia())
                .last()
                .is_some_and(|token| token.kind() == SyntaxKind::RBrace)
        })
    }
}

// ── expressions ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(LiteralExpr),
    Template(TemplateExpr),
    Variable(VariableExpr),
    Traversal(TraversalExpr),
    FuncCall(FuncCallExpr),
    Tuple(TupleExpr),
    Object(ObjectExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Conditional(ConditionalExpr),
    For(ForExpr),
    Parenthesized(ParenExpr),
    Invalid(ErrorExpr),
}

impl AstNode for Expr {
    fn cast(syntax: SyntaxNode) -> Option<Self> {
        let expr = match syntax.kind() {
            SyntaxKind::LiteralExpr => Expr::Literal(LiteralExpr { syntax }),
            SyntaxKind::TemplateExpr => Expr::Template(TemplateExpr { syntax }),
            SyntaxKind::VariableExpr => Expr::Variable(VariableExpr { syntax }),
            SyntaxKind::TraversalExpr => Expr::Traversal(TraversalExpr { syntax }),
            SyntaxKind::FuncCallExpr => Expr::FuncCall(FuncCallExpr { syntax }),
            SyntaxKind::TupleExpr => Expr::Tuple(TupleExpr { syntax }),
            SyntaxKind::ObjectExpr => Expr::Object(ObjectExpr { syntax }),
            SyntaxKind::UnaryExpr => Expr::Unary(UnaryExpr { syntax }),
            SyntaxKind::BinaryExpr => Expr::Binary(BinaryExpr { syntax }),
            SyntaxKind::ConditionalExpr => Expr::Conditional(ConditionalExpr { syntax }),
            SyntaxKind::ForExpr => Expr::For(ForExpr { syntax }),
            SyntaxKind::ParenExpr => Expr::Parenthesized(ParenExpr { syntax }),
            SyntaxKind::ErrorExpr => Expr::Invalid(ErrorExpr { syntax }),
            _ => return None,
        };
        Some(expr)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(it) => it.syntax(),
            Expr::Template(it) => it.syntax(),
            Expr::Variable(it) => it.syntax(),
            Expr::Traversal(it) => it.syntax(),
            Expr::FuncCall(it) => it.syntax(),
            Expr::Tuple(it) => it.syntax(),
            Expr::Object(it) => it.syntax(),
            Expr::Unary(it) => it.syntax(),
            Expr::Binary(it) => it.syntax(),
            Expr::Conditional(it) => it.syntax(),
            Expr::For(it) => it.syntax(),
            Expr::Parenthesized(it) => it.syntax(),
            Expr::Invalid(it) => it.syntax(),
        }
    }
}

impl Expr {
    /// The literal string value when the expression is a template without
    /// interpolations.
    pub fn as_static_string(&self) -> Option<String> {
        match self {
            Expr::Template(template) => template.as_literal(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
}

impl LiteralExpr {
    pub fn value(&self) -> Literal {
        let text = direct_tokens(&self.syntax)
            .find(|token| !token.kind().is_trivia())
            .map(|token| token.text().to_owned())
            .unwrap_or_default();
        match text.as_str() {
            "null" => Literal::Null,
            "true" => Literal::Bool(true),
            "false" => Literal::Bool(false),
            number => Literal::Number(number.parse().unwrap_or(0.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplatePart {
    Literal(String),
    Interpolation(Expr),
}

impl TemplateExpr {
    pub fn parts(&self) -> Vec<TemplatePart> {
        let mut parts = Vec::new();
        for element in self.syntax.children_with_tokens() {
            match element {
                NodeOrToken::Token(token) => match token.kind() {
                    SyntaxKind::TemplateLiteral => parts.push(TemplatePart::Literal(decode_literal(token.text()))),
                    SyntaxKind::Heredoc => parts.push(TemplatePart::Literal(heredoc_body(token.text()))),
                    _ => {},
                },
                NodeOrToken::Node(node) => {
                    if let Some(expr) = node.children().find_map(Expr::cast) {
                        parts.push(TemplatePart::Interpolation(expr));
                    }
                },
            }
        }
        parts
    }

    /// `%{ ... }` directives are kept opaque; their output is not modeled.
    pub fn has_directives(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::TemplateDirective)
    }

    pub fn as_literal(&self) -> Option<String> {
        if self.has_directives() {
            return None;
        }
        let mut out = String::new();
        for part in self.parts() {
            match part {
                TemplatePart::Literal(text) => out.push_str(&text),
                TemplatePart::Interpolation(_) => return None,
            }
        }
        Some(out)
    }
}

impl VariableExpr {
    pub fn ident(&self) -> Ident {
        first_ident_token(&self.syntax)
            .map_or_else(|| Ident::missing(self.span().start), |token| Ident::from_token(&token))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraversalOperator {
    GetAttr(Ident),
    Index(Expr),
    LegacyIndex { index: u64, span: Span },
    AttrSplat(Span),
    FullSplat(Span),
}

impl TraversalOperator {
    pub fn span(&self) -> Span {
        match self {
            TraversalOperator::GetAttr(ident) => ident.span.clone(),
            TraversalOperator::Index(expr) => expr.span(),
            TraversalOperator::LegacyIndex { span, .. }
            | TraversalOperator::AttrSplat(span)
            | TraversalOperator::FullSplat(span) => span.clone(),
        }
    }
}

impl TraversalExpr {
    pub fn root(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    /// Operators in source order. A `.` without a name contributes nothing,
    /// and `a.0.1` contributes one legacy index per integer.
    pub fn operators(&self) -> Vec<TraversalOperator> {
        let mut operators = Vec::new();
        for node in self.syntax.children() {
            match node.kind() {
                SyntaxKind::GetAttr => {
                    if let Some(token) = first_ident_token(&node) {
                        operators.push(TraversalOperator::GetAttr(Ident::from_token(&token)));
                    }
                },
                SyntaxKind::IndexOp => {
                    if let Some(expr) = child_exprs(&node).next() {
                        operators.push(TraversalOperator::Index(expr));
                    }
                },
                SyntaxKind::LegacyIndex => {
                    let Some(token) = direct_tokens(&node).find(|token| token.kind() == SyntaxKind::Number) else {
                        continue;
                    };
                    let mut offset = token_span(&token).start;
                    for part in token.text().split('.') {
                        if let Ok(index) = part.parse::<u64>() {
                            operators.push(TraversalOperator::LegacyIndex {
                                index,
                                span: offset..offset + part.len(),
                            });
                        }
                        offset += part.len() + 1;
                    }
                },
                SyntaxKind::AttrSplat => operators.push(TraversalOperator::AttrSplat(node_span(&node))),
                SyntaxKind::FullSplat => operators.push(TraversalOperator::FullSplat(node_span(&node))),
                _ => {},
            }
        }
        operators
    }
}

impl FuncCallExpr {
    pub fn name(&self) -> Ident {
        first_ident_token(&self.syntax)
            .map_or_else(|| Ident::missing(self.span().start), |token| Ident::from_token(&token))
    }

    pub fn args(&self) -> impl Iterator<Item = Expr> + use<> {
        child_exprs(&self.syntax)
    }

    /// `f(xs...)`: the final argument is expanded into separate arguments.
    pub fn expands_final(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::Ellipsis)
    }
}

impl TupleExpr {
    pub fn items(&self) -> impl Iterator<Item = Expr> + use<> {
        child_exprs(&self.syntax)
    }
}

impl ObjectExpr {
    pub fn items(&self) -> impl Iterator<Item = ObjectItem> + use<> {
        self.syntax.children().filter_map(ObjectItem::cast)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// A bare name, which is the key itself rather than a variable.
    Ident(Ident),
    Expr(Expr),
}

impl ObjectItem {
    pub fn key(&self) -> Option<ObjectKey> {
        let key = child_exprs(&self.syntax).next()?;
        Some(match key {
            Expr::Variable(variable) => ObjectKey::Ident(variable.ident()),
            expr => ObjectKey::Expr(expr),
        })
    }

    /// `None` when the item has no `=` or `:` and so no value.
    pub fn value(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

impl UnaryExpr {
    pub fn op(&self) -> UnaryOperator {
        match direct_tokens(&self.syntax).find(|token| !token.kind().is_trivia()).map(|token| token.kind()) {
            Some(SyntaxKind::Exclaim) => UnaryOperator::Not,
            _ => UnaryOperator::Neg,
        }
    }

    pub fn operand(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq | BinaryOperator::NotEq => 3,
            BinaryOperator::Less | BinaryOperator::LessEq | BinaryOperator::Greater | BinaryOperator::GreaterEq => 4,
            BinaryOperator::Add | BinaryOperator::Sub => 5,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEq => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEq => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
        }
    }
}

pub(crate) fn binary_operator(kind: SyntaxKind) -> Option<BinaryOperator> {
    Some(match kind {
        SyntaxKind::OrOr => BinaryOperator::Or,
        SyntaxKind::AndAnd => BinaryOperator::And,
        SyntaxKind::EqualEqual => BinaryOperator::Eq,
        SyntaxKind::NotEqual => BinaryOperator::NotEq,
        SyntaxKind::Less => BinaryOperator::Less,
        SyntaxKind::LessEqual => BinaryOperator::LessEq,
        SyntaxKind::Greater => BinaryOperator::Greater,
        SyntaxKind::GreaterEqual => BinaryOperator::GreaterEq,
        SyntaxKind::Plus => BinaryOperator::Add,
        SyntaxKind::Minus => BinaryOperator::Sub,
        SyntaxKind::Star => BinaryOperator::Mul,
        SyntaxKind::Slash => BinaryOperator::Div,
        SyntaxKind::Percent => BinaryOperator::Mod,
        _ => return None,
    })
}

impl BinaryExpr {
    pub fn op(&self) -> Option<BinaryOperator> {
        direct_tokens(&self.syntax).find_map(|token| binary_operator(token.kind()))
    }

    pub fn lhs(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn rhs(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(1)
    }
}

impl ConditionalExpr {
    pub fn cond(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }

    pub fn then_expr(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(1)
    }

    pub fn else_expr(&self) -> Option<Expr> {
        child_exprs(&self.syntax).nth(2)
    }
}

impl ForExpr {
    /// `{ for ... }` builds an object, `[ for ... ]` a tuple.
    pub fn is_object(&self) -> bool {
        direct_tokens(&self.syntax).next().is_some_and(|token| token.kind() == SyntaxKind::LBrace)
    }

    /// `{ for k, v in xs : k => v... }` groups values sharing a key.
    pub fn is_grouping(&self) -> bool {
        has_token(&self.syntax, SyntaxKind::Ellipsis)
    }

    fn iterators(&self) -> Vec<Ident> {
        direct_tokens(&self.syntax)
            .skip_while(|token| token.kind() != SyntaxKind::ForKw)
            .take_while(|token| token.kind() != SyntaxKind::InKw)
            .filter(|token| token.kind() == SyntaxKind::Ident)
            .map(|token| Ident::from_token(&token))
            .collect()
    }

    pub fn key_var(&self) -> Option<Ident> {
        let mut iterators = self.iterators();
        (iterators.len() > 1).then(|| iterators.remove(0))
    }

    pub fn value_var(&self) -> Ident {
        self.iterators().pop().unwrap_or_else(|| Ident::missing(self.span().start))
    }

    /// Expressions ahead of `if`, in source order.
    fn clauses(&self) -> Vec<Expr> {
        let mut exprs = Vec::new();
        for element in self.syntax.children_with_tokens() {
            match element {
                NodeOrToken::Token(token) if token.kind() == SyntaxKind::IfKw => break,
                NodeOrToken::Node(node) => exprs.extend(Expr::cast(node)),
                NodeOrToken::Token(_) => {},
            }
        }
        exprs
    }

    pub fn collection(&self) -> Option<Expr> {
        self.clauses().into_iter().next()
    }

    pub fn key_expr(&self) -> Option<Expr> {
        if !self.is_object() {
            return None;
        }
        self.clauses().into_iter().nth(1)
    }

    pub fn value_expr(&self) -> Option<Expr> {
        let index = if self.is_object() { 2 } else { 1 };
        self.clauses().into_iter().nth(index)
    }

    pub fn cond(&self) -> Option<Expr> {
        self.syntax
            .children_with_tokens()
            .skip_while(|element| element.kind() != SyntaxKind::IfKw)
            .find_map(|element| element.into_node().and_then(Expr::cast))
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        child_exprs(&self.syntax).next()
    }
}

// ── literal text ────────────────────────────────────────────────────────

/// Value of a quoted label, with escapes decoded.
fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    decode_literal(inner)
}

/// Decode escapes and the `$${` / `%%{` sequences in a literal run of a
/// quoted template.
fn decode_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '\\' {
            let (decoded, len) = unescape(rest);
            out.push_str(&decoded);
            rest = &rest[len..];
        } else if rest.starts_with("$${") || rest.starts_with("%%{") {
            out.push(ch);
            out.push('{');
            rest = &rest[3..];
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Decode one escape sequence at the start of `text`, returning the decoded
/// string and the number of bytes consumed.
fn unescape(text: &str) -> (String, usize) {
    let mut chars = text.chars();
    chars.next();
    let Some(escaped) = chars.next() else {
        return ("\\".to_owned(), 1);
    };
    let decoded = match escaped {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '"' => '"',
        '\\' => '\\',
        'u' => {
            let hex = text.get(2..6).unwrap_or_default();
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return (ch.to_string(), 6);
            }
            return (text[..2].to_owned(), 2);
        },
        other => return (format!("\\{other}"), 1 + other.len_utf8()),
    };
    (decoded.to_string(), 1 + escaped.len_utf8())
}

fn heredoc_body(text: &str) -> String {
    let Some((_, rest)) = text.split_once('\n') else {
        return String::new();
    };
    match rest.rfind('\n') {
        Some(last) => rest[..=last].to_owned(),
        None => String::new(),
    }
}
