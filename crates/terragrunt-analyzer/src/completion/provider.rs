use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, InsertTextFormat, MarkupContent, MarkupKind,
};

use crate::{
    analysis::ParseResult,
    completion::keywords::{self, KeywordEntry},
    syntax::{DependencyDecl, Value},
};

/// Unranked completion: block keywords plus one
/// `dependency.<name>.outputs` item per declared dependency.
#[derive(Debug, Default)]
pub struct CompletionProvider;

impl CompletionProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        parse: Option<&ParseResult>,
    ) -> Vec<CompletionItem> {
        let mut items: Vec<CompletionItem> = keywords::all().iter().map(keyword_item).collect();
        if let Some(parse) = parse {
            items.extend(parse.dependencies.iter().map(dependency_item));
        }
        items
    }
}

fn keyword_item(entry: &KeywordEntry) -> CompletionItem {
    let insert_text = if entry.labeled {
        format!("{} \"${{1:name}}\" {{\n\t$0\n}}", entry.label)
    } else {
        format!("{} {{\n\t$0\n}}", entry.label)
    };
    CompletionItem {
        label: entry.label.to_owned(),
        kind: Some(CompletionItemKind::KEYWORD),
        detail: Some("block".to_owned()),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: entry.documentation.to_owned(),
        })),
        insert_text: Some(insert_text),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

fn dependency_item(decl: &DependencyDecl) -> CompletionItem {
    let label = format!("dependency.{}.outputs", decl.name);
    let documentation = match &decl.mock_outputs {
        Some(Value::Object(outputs)) if !outputs.is_empty() => {
            let keys: Vec<&str> = outputs.keys().map(String::as_str).collect();
            Some(Documentation::String(format!("mock_outputs: {}", keys.join(", "))))
        },
        _ => None,
    };
    CompletionItem {
        label: label.clone(),
        kind: Some(CompletionItemKind::VARIABLE),
        detail: decl.config_path.clone(),
        documentation,
        insert_text: Some(label),
        insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
        ..Default::default()
    }
}
