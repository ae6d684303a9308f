use std::path::Path;

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::{
    analysis::ParseResult,
    completion::keywords,
    index::{Symbol, SymbolKind},
};

/// Describes the symbol under the cursor from a committed parse.
#[derive(Debug, Default)]
pub struct HoverProvider;

impl HoverProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        parse: &ParseResult,
        position: Position,
    ) -> Option<Hover> {
        let symbol = parse.index.lookup_position(position)?;
        tracing::debug!("Hover on {:?} `{}`", symbol.kind, symbol.name);
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: render(symbol),
            }),
            range: Some(symbol.range),
        })
    }
}

fn render(symbol: &Symbol) -> String {
    let mut md = String::new();

    let code = match symbol.kind {
        SymbolKind::DependencyReference => format!("dependency.{}", symbol.name),
        SymbolKind::Block | SymbolKind::Attribute => symbol.name.clone(),
    };
    md.push_str("```hcl\n");
    md.push_str(&code);
    md.push_str("\n```\n");

    let kind_label = match symbol.kind {
        SymbolKind::Block => "block",
        SymbolKind::Attribute => "attribute",
        SymbolKind::DependencyReference => "dependency reference",
    };
    md.push_str(&format!("\n*({kind_label})*\n"));

    if symbol.kind == SymbolKind::Block
        && let Some(entry) = symbol.name.split_whitespace().next().and_then(keywords::lookup)
    {
        md.push_str("\n---\n\n");
        md.push_str(entry.documentation);
        md.push('\n');
    }

    if let Some(detail) = &symbol.detail {
        md.push_str("\n```hcl\n");
        md.push_str(detail);
        md.push_str("\n```\n");
    }

    if let Some(uri) = symbol.resolved_target_uri() {
        let shown = uri.to_file_path().ok();
        let shown = shown.as_deref().map(Path::display);
        match shown {
            Some(path) => md.push_str(&format!("\nDefined in `{path}`\n")),
            None => md.push_str(&format!("\nDefined in <{uri}>\n")),
        }
    }

    md
}
