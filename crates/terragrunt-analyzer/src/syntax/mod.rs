//! Terragrunt HCL decoder: lexer, recovering parser and a tolerant evaluator.
//!
//! The entry point is [`decode`], which never fails on bad input. Syntax and
//! evaluation problems come back as [`ParseError`] records next to the tree;
//! the only early exit is [`Interrupted`], raised when the caller's checkpoint
//! reports that the result is no longer wanted.

use std::{collections::BTreeMap, ops::Range, sync::Arc};

pub mod ast;
pub mod cst;
pub mod eval;
pub mod kind;
pub mod lexer;
pub mod parser;

pub use eval::{DependencyDecl, DependencyUnresolved, ModuleResolver, Shape, Value};
use rowan::GreenNode;

use crate::{
    syntax::{ast::Body, cst::SyntaxNode},
    text_pos::LineIndex,
};

/// What part of the pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Structure,
    Reference,
    Type,
    /// `dependency.<name>.outputs` could not be resolved. Editors never see
    /// these; the outputs of a module that was not applied are not an error
    /// in the buffer.
    DependencyUnresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorLevel {
    Error,
    Warning,
    Note,
}

/// 1-based line and 1-based column, counted in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub level: ErrorLevel,
    pub message: String,
    pub span: Range<usize>,
    pub start: Pos,
    pub end: Pos,
}

/// A problem found before positions are attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Report {
    pub kind: ErrorKind,
    pub level: ErrorLevel,
    pub message: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("decoding was interrupted")]
pub struct Interrupted;

/// An immutable parsed document. Cheap to clone and safe to share between
/// threads; typed views are created on demand with [`SyntaxTree::body`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxTree {
    green: GreenNode,
}

impl SyntaxTree {
    pub(crate) fn new(green: GreenNode) -> Self {
        Self { green }
    }

    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn body(&self) -> Body {
        Body::from_root(self.syntax())
    }
}

/// Output of a full decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
    /// Value shape of each evaluated attribute, keyed by the key's start offset.
    pub shapes: BTreeMap<usize, Shape>,
    pub dependencies: Vec<DependencyDecl>,
}

/// Parse only; no evaluation and no resolver.
pub fn parse(text: &str) -> (SyntaxTree, Vec<ParseError>) {
    let (tree, reports) = parser::Parser::new(text).parse();
    let line_index = LineIndex::new(Arc::from(text));
    (tree, attach_positions(&line_index, reports))
}

/// Parse and evaluate `text`.
///
/// Every `dependency.<name>.outputs` traversal is handed to `resolver`.
/// `is_interrupted` is polled before each top-level step; once it returns
/// `true` decoding stops with [`Interrupted`].
pub fn decode(
    text: &str,
    resolver: &dyn ModuleResolver,
    is_interrupted: &dyn Fn() -> bool,
) -> Result<Decoded, Interrupted> {
    if is_interrupted() {
        return Err(Interrupted);
    }
    let (tree, mut reports) = parser::Parser::new(text).parse();
    if is_interrupted() {
        return Err(Interrupted);
    }

    let evaluated = eval::evaluate(&tree.body(), resolver, is_interrupted)?;
    reports.extend(evaluated.reports);

    let line_index = LineIndex::new(Arc::from(text));
    Ok(Decoded {
        errors: attach_positions(&line_index, reports),
        tree,
        shapes: evaluated.shapes,
        dependencies: evaluated.dependencies,
    })
}

fn attach_positions(
    line_index: &LineIndex,
    reports: Vec<Report>,
) -> Vec<ParseError> {
    let to_pos = |offset: usize| {
        let position = line_index.position_of(offset);
        Pos {
            line: position.line + 1,
            column: position.character + 1,
        }
    };
    reports
        .into_iter()
        .map(|report| ParseError {
            start: to_pos(report.span.start),
            end: to_pos(report.span.end),
            kind: report.kind,
            level: report.level,
            message: report.message,
            span: report.span,
        })
        .collect()
}
