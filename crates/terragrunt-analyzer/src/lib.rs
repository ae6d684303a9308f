pub mod analysis;
pub mod completion;
pub mod config;
pub mod definition;
pub mod diagnostics;
pub mod document;
pub mod hover;
pub mod index;
pub mod server;
pub mod syntax;
pub mod text_pos;

pub use analysis::{ParseAdapter, ParseResult, ParseScheduler};
pub use completion::CompletionProvider;
pub use config::{Capabilities, ServerConfig, ServerInfoConfig, ServerSettings};
pub use definition::DefinitionProvider;
pub use document::{Document, DocumentState, DocumentStore};
pub use hover::HoverProvider;
pub use index::{PositionIndex, Symbol, SymbolKind};
pub use server::TerragruntLanguageServer;
