use tower_lsp::lsp_types::{
    CompletionOptions, HoverProviderCapability, OneOf, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind,
};

/// Name and version reported in `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfoConfig {
    pub name: String,
    pub version: String,
}

impl ServerInfoConfig {
    pub fn to_lsp(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            version: Some(self.version.clone()),
        }
    }
}

/// Feature switches advertised to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub hover: bool,
    pub definition: bool,
    pub completion: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            hover: true,
            definition: true,
            completion: true,
        }
    }
}

impl Capabilities {
    pub fn to_lsp(&self) -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: self.hover.then_some(HoverProviderCapability::Simple(true)),
            definition_provider: self.definition.then_some(OneOf::Left(true)),
            completion_provider: self.completion.then(|| CompletionOptions {
                trigger_characters: Some(vec![".".to_owned()]),
                ..CompletionOptions::default()
            }),
            ..ServerCapabilities::default()
        }
    }
}

/// Static configuration fixed at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_info: ServerInfoConfig,
    pub capabilities: Capabilities,
}

impl ServerConfig {
    pub fn from_build() -> Self {
        Self {
            server_info: ServerInfoConfig {
                name: env!("CARGO_PKG_NAME").to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
            capabilities: Capabilities::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_build()
    }
}
