use tower_lsp::lsp_types::{GotoDefinitionResponse, Position};
use tracing::debug;

use crate::{analysis::ParseResult, index::Unresolvable};

/// Go-to-definition for dependency references and dependency blocks.
///
/// Targets are resolved while parsing; answering never touches the disk.
#[derive(Debug, Default)]
pub struct DefinitionProvider;

impl DefinitionProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        parse: &ParseResult,
        position: Position,
    ) -> Option<GotoDefinitionResponse> {
        let symbol = parse.index.lookup_position(position)?;
        match parse.index.resolve_definition(symbol) {
            Ok(location) => Some(GotoDefinitionResponse::Scalar(location)),
            Err(Unresolvable::NoTarget {
                name,
            }) => {
                debug!("No definition target for `{name}`");
                None
            },
            Err(err) => {
                debug!("Definition lookup failed: {err}");
                None
            },
        }
    }
}
