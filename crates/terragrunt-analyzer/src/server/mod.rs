pub(crate) mod handler;
pub(crate) mod publish;
pub(crate) mod state;

pub use publish::ClientSink;
pub use state::TerragruntLanguageServer;
