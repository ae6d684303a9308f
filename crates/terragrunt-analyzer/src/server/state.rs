use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use tokio::sync::RwLock;
use tower_lsp::{
    Client,
    lsp_types::{MessageType, Url},
};

use crate::{
    analysis::{ParseOptions, ParseResult, ParseScheduler},
    completion::CompletionProvider,
    config::{ServerConfig, ServerSettings},
    definition::DefinitionProvider,
    document::DocumentStore,
    hover::HoverProvider,
    server::publish::ClientSink,
};

const CLIENT_NOTIFICATION_PREFIX: &str = "terragrunt-analyzer:";

/// The terragrunt-analyzer backend that implements the Language Server Protocol.
pub struct TerragruntLanguageServer {
    /// The LSP client handle, used to send notifications back.
    pub(crate) client: Client,

    /// Name, version and capabilities; fixed for the whole session.
    pub(crate) config: Arc<ServerConfig>,

    /// All open buffers and their committed parses.
    pub(crate) document_store: Arc<DocumentStore>,

    /// Debounced background parses that publish diagnostics.
    pub(crate) scheduler: ParseScheduler<ClientSink>,

    pub(crate) hover_provider: Arc<HoverProvider>,
    pub(crate) definition_provider: Arc<DefinitionProvider>,
    pub(crate) completion_provider: Arc<CompletionProvider>,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
}

impl TerragruntLanguageServer {
    pub fn new(
        client: Client,
        config: Arc<ServerConfig>,
    ) -> Self {
        let document_store = Arc::new(DocumentStore::new());
        let sink = Arc::new(ClientSink::new(client.clone()));
        let scheduler = ParseScheduler::new(Arc::clone(&document_store), sink);

        Self {
            client,
            config,
            document_store,
            scheduler,
            hover_provider: Arc::new(HoverProvider::new()),
            definition_provider: Arc::new(DefinitionProvider::new()),
            completion_provider: Arc::new(CompletionProvider::new()),
            settings: Arc::new(RwLock::new(ServerSettings::default())),
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    pub(crate) async fn apply_settings(
        &self,
        settings: ServerSettings,
    ) {
        *self.settings.write().await = settings;
    }

    /// Queue a parse of `generation`, using the settings in effect now.
    pub(crate) async fn schedule_parse(
        &self,
        uri: Url,
        generation: u64,
    ) {
        let options = ParseOptions::from(&self.settings_snapshot().await);
        drop(self.scheduler.schedule(uri, generation, options));
    }

    /// The parse navigation requests answer from, waiting briefly for an
    /// in-flight parse of the current text.
    pub(crate) async fn committed_parse(
        &self,
        uri: &Url,
    ) -> Option<Arc<ParseResult>> {
        let grace = Duration::from_millis(self.settings_snapshot().await.navigation.hover_grace_ms);
        self.document_store.settled_parse(uri, grace).await
    }

    pub(crate) async fn log_to_client(
        &self,
        kind: MessageType,
        message: impl AsRef<str>,
    ) {
        if !self.settings_snapshot().await.logging.level.admits(kind) {
            return;
        }
        let _ = AssertUnwindSafe(self.client.log_message(kind, prefixed_client_message(message)))
            .catch_unwind()
            .await;
    }
}

pub(crate) fn prefixed_client_message(message: impl AsRef<str>) -> String {
    format!("{CLIENT_NOTIFICATION_PREFIX} {}", message.as_ref())
}
