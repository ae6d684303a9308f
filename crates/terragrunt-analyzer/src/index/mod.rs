//! Position index over the named parts of a parsed configuration.
//!
//! Symbols are keyed by their *name* span (block header, attribute key,
//! `dependency.<name>...` traversal), which keeps the list sorted and free of
//! overlaps even though blocks nest. Block extents are kept separately so that
//! a cursor inside a block body that is not on any name still resolves to the
//! innermost enclosing block.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Range,
    path::PathBuf,
};

use tower_lsp::lsp_types::{self, Location, Position, Url};

use crate::{
    syntax::{
        DependencyDecl, Shape, Value,
        ast::{AstNode, Block, Body, Expr, ObjectKey, Structure, TemplatePart, TraversalOperator},
    },
    text_pos::LineIndex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Block,
    Attribute,
    DependencyReference,
}

/// Where a dependency's configuration lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTarget {
    pub uri: Url,
    pub range: lsp_types::Range,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Byte span of the symbol's name.
    pub span: Range<usize>,
    /// `span` in protocol coordinates.
    pub range: lsp_types::Range,
    /// Byte span of the whole construct the name belongs to.
    pub extent: Range<usize>,
    pub detail: Option<String>,
    pub target: Option<ModuleTarget>,
}

impl Symbol {
    pub fn resolved_target_uri(&self) -> Option<&Url> {
        self.target.as_ref().map(|target| &target.uri)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Unresolvable {
    #[error("`{name}` has no definition target")]
    NoTarget { name: String },
    #[error("dependency `{name}` has no static `config_path`")]
    NoConfigPath { name: String },
    #[error("document `{uri}` is not a local file")]
    NotAFile { uri: Url },
    #[error("config `{}` does not exist", path.display())]
    MissingConfig { path: PathBuf },
    #[error("failed to read config `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config `{}` has {count} syntax error(s)", path.display())]
    InvalidConfig { path: PathBuf, count: usize },
    #[error("cannot express `{}` as a file URI", path.display())]
    InvalidPath { path: PathBuf },
}

/// Facts from evaluation that decorate symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolFacts<'a> {
    pub shapes: Option<&'a BTreeMap<usize, Shape>>,
    pub dependencies: &'a [DependencyDecl],
    pub targets: Option<&'a HashMap<String, ModuleTarget>>,
}

#[derive(Debug, Clone)]
struct BlockNode {
    extent: Range<usize>,
    symbol: Symbol,
    children: Vec<BlockNode>,
}

#[derive(Debug, Clone)]
pub struct PositionIndex {
    symbols: Vec<Symbol>,
    blocks: Vec<BlockNode>,
    line_index: LineIndex,
}

impl PositionIndex {
    pub fn build(
        tree: &Body,
        line_index: LineIndex,
        facts: &SymbolFacts<'_>,
    ) -> Self {
        let mut builder = Builder {
            line_index: &line_index,
            facts,
            symbols: Vec::new(),
        };
        let blocks = builder.visit_body(tree);
        let mut symbols = builder.symbols;

        symbols.sort_by(|a, b| a.span.start.cmp(&b.span.start).then(b.span.end.cmp(&a.span.end)));
        let mut kept: Vec<Symbol> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if kept.last().is_some_and(|last| symbol.span.start < last.span.end) {
                continue;
            }
            kept.push(symbol);
        }

        Self {
            symbols: kept,
            blocks,
            line_index,
        }
    }

    /// All symbols, sorted by start offset and non-overlapping.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// The symbol whose name covers `offset` (end inclusive, so a cursor
    /// right after a name still hits it), else the innermost block around
    /// `offset`.
    pub fn lookup(
        &self,
        offset: usize,
    ) -> Option<&Symbol> {
        let idx = self.symbols.partition_point(|symbol| symbol.span.start <= offset);
        if let Some(symbol) = idx.checked_sub(1).map(|i| &self.symbols[i])
            && offset <= symbol.span.end
        {
            return Some(symbol);
        }
        innermost_block(&self.blocks, offset)
    }

    pub fn lookup_position(
        &self,
        position: Position,
    ) -> Option<&Symbol> {
        let offset = self.line_index.offset_of(position)?;
        self.lookup(offset)
    }

    /// Definition target of a dependency reference or dependency block.
    pub fn resolve_definition(
        &self,
        symbol: &Symbol,
    ) -> Result<Location, Unresolvable> {
        match &symbol.target {
            Some(target) => Ok(Location::new(target.uri.clone(), target.range)),
            None => Err(Unresolvable::NoTarget {
                name: symbol.name.clone(),
            }),
        }
    }
}

fn innermost_block(
    blocks: &[BlockNode],
    offset: usize,
) -> Option<&Symbol> {
    let node = blocks.iter().find(|node| node.extent.start <= offset && offset < node.extent.end)?;
    innermost_block(&node.children, offset).or(Some(&node.symbol))
}

struct Builder<'a> {
    line_index: &'a LineIndex,
    facts: &'a SymbolFacts<'a>,
    symbols: Vec<Symbol>,
}

impl Builder<'_> {
    fn symbol(
        &self,
        kind: SymbolKind,
        name: String,
        span: Range<usize>,
        extent: Range<usize>,
    ) -> Symbol {
        Symbol {
            kind,
            name,
            range: self.line_index.range_of(&span),
            span,
            extent,
            detail: None,
            target: None,
        }
    }

    fn visit_body(
        &mut self,
        body: &Body,
    ) -> Vec<BlockNode> {
        let mut blocks = Vec::new();
        for item in body.items() {
            match item {
                Structure::Attribute(attr) => {
                    let key = attr.key();
                    let mut symbol = self.symbol(SymbolKind::Attribute, key.name, key.span.clone(), attr.span());
                    symbol.detail = self
                        .facts
                        .shapes
                        .and_then(|shapes| shapes.get(&key.span.start))
                        .map(|shape| shape.name().to_owned());
                    self.symbols.push(symbol);
                    self.visit_opt(attr.value());
                },
                Structure::Block(block) => blocks.push(self.visit_block(&block)),
            }
        }
        blocks
    }

    fn visit_block(
        &mut self,
        block: &Block,
    ) -> BlockNode {
        let mut symbol = self.symbol(
            SymbolKind::Block,
            block.header_text(),
            block.header_span(),
            block.span(),
        );
        if block.ident().name == "dependency"
            && let Some(name) = block.first_label()
        {
            symbol.detail = self.dependency_detail(&name);
            symbol.target = self.target(&name);
        }
        self.symbols.push(symbol.clone());

        let children = block.body().map(|body| self.visit_body(&body)).unwrap_or_default();
        BlockNode {
            extent: block.span(),
            symbol,
            children,
        }
    }

    fn visit_opt(
        &mut self,
        expr: Option<Expr>,
    ) {
        if let Some(expr) = expr {
            self.visit_expr(&expr);
        }
    }

    fn visit_expr(
        &mut self,
        expr: &Expr,
    ) {
        match expr {
            Expr::Traversal(traversal) => {
                let operators = traversal.operators();
                let root = traversal.root();
                let dependency_root = match &root {
                    Some(Expr::Variable(variable)) => Some(variable.ident()).filter(|ident| ident.name == "dependency"),
                    _ => None,
                };
                if let Some(ident) = dependency_root
                    && let Some(TraversalOperator::GetAttr(name)) = operators.first()
                {
                    let end = operators
                        .iter()
                        .map_while(|op| match op {
                            TraversalOperator::GetAttr(attr) => Some(attr.span.end),
                            _ => None,
                        })
                        .last()
                        .unwrap_or(name.span.end);
                    let mut symbol = self.symbol(
                        SymbolKind::DependencyReference,
                        name.name.clone(),
                        ident.span.start..end,
                        expr.span(),
                    );
                    symbol.detail = self.dependency_detail(&name.name);
                    symbol.target = self.target(&name.name);
                    self.symbols.push(symbol);
                } else {
                    self.visit_opt(root);
                }
                for op in &operators {
                    if let TraversalOperator::Index(index) = op {
                        self.visit_expr(index);
                    }
                }
            },
            Expr::Template(template) => {
                for part in template.parts() {
                    if let TemplatePart::Interpolation(inner) = part {
                        self.visit_expr(&inner);
                    }
                }
            },
            Expr::FuncCall(call) => call.args().for_each(|arg| self.visit_expr(&arg)),
            Expr::Tuple(tuple) => tuple.items().for_each(|item| self.visit_expr(&item)),
            Expr::Object(object) => {
                for item in object.items() {
                    if let Some(ObjectKey::Expr(key)) = item.key() {
                        self.visit_expr(&key);
                    }
                    self.visit_opt(item.value());
                }
            },
            Expr::Unary(unary) => self.visit_opt(unary.operand()),
            Expr::Binary(binary) => {
                self.visit_opt(binary.lhs());
                self.visit_opt(binary.rhs());
            },
            Expr::Conditional(conditional) => {
                self.visit_opt(conditional.cond());
                self.visit_opt(conditional.then_expr());
                self.visit_opt(conditional.else_expr());
            },
            Expr::For(for_expr) => {
                self.visit_opt(for_expr.collection());
                self.visit_opt(for_expr.key_expr());
                self.visit_opt(for_expr.value_expr());
                self.visit_opt(for_expr.cond());
            },
            Expr::Parenthesized(paren) => self.visit_opt(paren.inner()),
            Expr::Literal(_) | Expr::Variable(_) | Expr::Invalid(_) => {},
        }
    }

    fn target(
        &self,
        name: &str,
    ) -> Option<ModuleTarget> {
        self.facts.targets.and_then(|targets| targets.get(name)).cloned()
    }

    fn dependency_detail(
        &self,
        name: &str,
    ) -> Option<String> {
        let decl = self.facts.dependencies.iter().find(|decl| decl.name == name)?;
        let mut detail = match &decl.config_path {
            Some(path) => format!("config_path = \"{path}\""),
            None => "config_path is not a static string".to_owned(),
        };
        if let Some(Value::Object(outputs)) = &decl.mock_outputs {
            let keys: Vec<&str> = outputs.keys().map(String::as_str).collect();
            detail.push_str(&format!("\nmock_outputs: {}", keys.join(", ")));
        }
        Some(detail)
    }
}

#[cfg(test)]
#[path = "../../tests/src/index/position_index_tests.rs"]
mod tests;
