use std::{
    cell::Cell,
    collections::HashMap,
    sync::Arc,
    time::Instant,
};

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::{
    analysis::resolver::{DiskResolver, PlaceholderResolver},
    diagnostics::{self, Diagnostic, Severity},
    index::{PositionIndex, Symbol, SymbolFacts},
    syntax::{self, DependencyDecl, SyntaxTree},
    text_pos::LineIndex,
};

/// Default `source` tag on published diagnostics.
pub const DEFAULT_DIAGNOSTIC_SOURCE: &str = "terragrunt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Look up each dependency's configuration on disk for go-to-definition.
    pub resolve_dependencies: bool,
    pub source: String,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            resolve_dependencies: true,
            source: DEFAULT_DIAGNOSTIC_SOURCE.to_owned(),
        }
    }
}

/// Why a parse attempt produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseAbort {
    #[error("parse exceeded its deadline")]
    Timeout,
    #[error("parse was superseded by a newer edit")]
    Cancelled,
}

/// Immutable outcome of one completed parse.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub uri: Url,
    pub version_parsed: i32,
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
    pub index: PositionIndex,
    pub dependencies: Vec<DependencyDecl>,
}

impl ParseResult {
    pub fn symbols(&self) -> &[Symbol] {
        self.index.symbols()
    }

    pub fn line_index(&self) -> &LineIndex {
        self.index.line_index()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|diag| diag.severity == Severity::Error)
    }
}

/// Runs the decoder over an editor buffer and packages what the editor needs.
///
/// Dependency outputs are always read through [`PlaceholderResolver`], so a
/// unit whose dependencies were never applied still decodes cleanly. Disk
/// lookups only decorate symbols with definition targets.
#[derive(Debug, Clone, Default)]
pub struct ParseAdapter {
    options: AdapterOptions,
}

impl ParseAdapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self {
            options,
        }
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Parse `text` as version `version` of `uri`.
    ///
    /// `is_cancelled` and `deadline` are checked at every evaluator safe
    /// point and between dependency lookups.
    pub fn parse(
        &self,
        uri: &Url,
        text: Arc<str>,
        version: i32,
        deadline: Instant,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<ParseResult, ParseAbort> {
        let abort = Cell::new(None);
        let checkpoint = || {
            if is_cancelled() {
                abort.set(Some(ParseAbort::Cancelled));
            } else if Instant::now() >= deadline {
                abort.set(Some(ParseAbort::Timeout));
            }
            abort.get().is_some()
        };

        let decoded = syntax::decode(&text, &PlaceholderResolver, &checkpoint)
            .map_err(|_| abort.get().unwrap_or(ParseAbort::Cancelled))?;
        let diagnostics = diagnostics::translate(&decoded.errors, &self.options.source);

        let mut targets = HashMap::new();
        if self.options.resolve_dependencies && !decoded.dependencies.is_empty() {
            match DiskResolver::for_document(uri) {
                Ok(resolver) => {
                    for dependency in &decoded.dependencies {
                        if checkpoint() {
                            return Err(abort.get().unwrap_or(ParseAbort::Cancelled));
                        }
                        match resolver.locate(dependency) {
                            Ok(target) => {
                                targets.insert(dependency.name.clone(), target);
                            },
                            Err(err) => debug!("Dependency `{}` of {uri} is unresolvable: {err}", dependency.name),
                        }
                    }
                },
                Err(err) => debug!("Skipping dependency resolution: {err}"),
            }
        }

        let facts = SymbolFacts {
            shapes: Some(&decoded.shapes),
            dependencies: &decoded.dependencies,
            targets: Some(&targets),
        };
        let index = PositionIndex::build(&decoded.tree.body(), LineIndex::new(text), &facts);

        Ok(ParseResult {
            uri: uri.clone(),
            version_parsed: version,
            tree: decoded.tree,
            diagnostics,
            index,
            dependencies: decoded.dependencies,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src/analysis/adapter_tests.rs"]
mod tests;
