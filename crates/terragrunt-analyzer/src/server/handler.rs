use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info};

use crate::{
    analysis::DiagnosticsSink,
    config::ServerSettings,
    document::StoreError,
    server::state::TerragruntLanguageServer,
};

#[tower_lsp::async_trait]
impl LanguageServer for TerragruntLanguageServer {
    async fn initialize(
        &self,
        params: InitializeParams,
    ) -> Result<InitializeResult> {
        info!("Initializing {}...", self.config.server_info.name);

        let initial_settings = ServerSettings::from_lsp_payload(params.initialization_options.as_ref());
        self.apply_settings(initial_settings).await;

        Ok(InitializeResult {
            capabilities: self.config.capabilities.to_lsp(),
            server_info: Some(self.config.server_info.to_lsp()),
        })
    }

    async fn initialized(
        &self,
        _: InitializedParams,
    ) {
        info!("{} {} initialized", self.config.server_info.name, self.config.server_info.version);
        self.log_to_client(MessageType::INFO, "Ready").await;
    }

    async fn did_change_configuration(
        &self,
        params: DidChangeConfigurationParams,
    ) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }

        let reparse = merged.diagnostics != current.diagnostics
            || merged.navigation.resolve_dependencies != current.navigation.resolve_dependencies;
        self.apply_settings(merged).await;
        info!("Applied updated terragrunt-analyzer settings");

        if reparse {
            for uri in self.document_store.all_uris() {
                match self.document_store.refresh(&uri).await {
                    Ok(generation) => self.schedule_parse(uri, generation).await,
                    Err(err) => debug!("Skipping re-parse: {err}"),
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down {}", self.config.server_info.name);
        Ok(())
    }

    async fn did_open(
        &self,
        params: DidOpenTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        let filename = short_name(&uri);

        info!("Opened {filename} (v{version}, {} bytes)", text.len());
        self.log_to_client(MessageType::LOG, format!("Opened {filename}")).await;

        let generation = self.document_store.open(uri.clone(), text, version).await;
        self.schedule_parse(uri, generation).await;
    }

    async fn did_change(
        &self,
        params: DidChangeTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole buffer.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        match self.document_store.update(&uri, change.text, version).await {
            Ok(generation) => self.schedule_parse(uri, generation).await,
            Err(err @ StoreError::StaleVersion { .. }) => debug!("Dropping edit: {err}"),
            Err(err) => debug!("Ignoring change: {err}"),
        }
    }

    async fn did_close(
        &self,
        params: DidCloseTextDocumentParams,
    ) {
        let uri = params.text_document.uri;
        if !self.document_store.close(&uri).await {
            debug!("Close of untracked document {uri}");
            return;
        }
        info!("Closed {}", short_name(&uri));
        self.scheduler.sink().publish(uri, Vec::new(), None).await;
    }

    async fn hover(
        &self,
        params: HoverParams,
    ) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(parse) = self.committed_parse(&uri).await else {
            return Ok(None);
        };
        Ok(self.hover_provider.provide(&parse, position))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(parse) = self.committed_parse(&uri).await else {
            return Ok(None);
        };
        let response = self.definition_provider.provide(&parse, position);
        if response.is_none() {
            debug!("No definition at {}:{}:{}", short_name(&uri), position.line, position.character);
        }
        Ok(response)
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let parse = self.committed_parse(&uri).await;
        let items = self.completion_provider.provide(parse.as_deref());
        Ok(Some(CompletionResponse::Array(items)))
    }
}

fn short_name(uri: &Url) -> String {
    uri.path().rsplit('/').next().unwrap_or(uri.path()).to_owned()
}
