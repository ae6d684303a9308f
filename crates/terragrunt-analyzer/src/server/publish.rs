use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tower_lsp::{
    Client,
    lsp_types::{Diagnostic, Url},
};
use tracing::warn;

use crate::analysis::DiagnosticsSink;

/// Publishes diagnostics to the connected editor.
#[derive(Clone)]
pub struct ClientSink {
    client: Client,
}

impl ClientSink {
    pub fn new(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[tower_lsp::async_trait]
impl DiagnosticsSink for ClientSink {
    async fn publish(
        &self,
        uri: Url,
        diagnostics: Vec<Diagnostic>,
        version: Option<i32>,
    ) {
        let result = AssertUnwindSafe(self.client.publish_diagnostics(uri, diagnostics, version)).catch_unwind().await;
        if result.is_err() {
            warn!("publish_diagnostics panicked (client may have disconnected)");
        }
    }
}
