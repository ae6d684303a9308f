use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;
use tower_lsp::lsp_types::{self, Url};
use tracing::{debug, warn};

use crate::{
    analysis::adapter::{AdapterOptions, ParseAbort, ParseAdapter, ParseResult},
    config::ServerSettings,
    document::{DocumentStore, ParseTicket, StoreError},
};

/// Destination of committed diagnostics; an empty list clears the document.
#[tower_lsp::async_trait]
pub trait DiagnosticsSink: Send + Sync + 'static {
    async fn publish(
        &self,
        uri: Url,
        diagnostics: Vec<lsp_types::Diagnostic>,
        version: Option<i32>,
    );
}

/// Per-run knobs, snapshotted from the settings when the run is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub debounce: Duration,
    pub timeout: Duration,
    pub publish_diagnostics: bool,
    pub adapter: AdapterOptions,
}

impl From<&ServerSettings> for ParseOptions {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            debounce: Duration::from_millis(settings.parse.debounce_ms),
            timeout: Duration::from_millis(settings.parse.timeout_ms),
            publish_diagnostics: settings.diagnostics.enable,
            adapter: AdapterOptions {
                resolve_dependencies: settings.navigation.resolve_dependencies,
                source: settings.diagnostics.source.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Committed and published.
    Published,
    /// A newer edit arrived before the result could be committed.
    Superseded,
    TimedOut,
    /// The document was closed.
    Closed,
    /// The parse task panicked.
    Failed,
}

/// Runs parses for open documents.
///
/// Each run snapshots the text, evaluates on the blocking pool and commits
/// only if its generation is still the document's latest. Commit and publish
/// happen under the document's lock, so a superseded result can never be
/// published after a newer one.
pub struct ParseScheduler<S> {
    store: Arc<DocumentStore>,
    sink: Arc<S>,
}

impl<S> Clone for ParseScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: DiagnosticsSink> ParseScheduler<S> {
    pub fn new(
        store: Arc<DocumentStore>,
        sink: Arc<S>,
    ) -> Self {
        Self {
            store,
            sink,
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Start a background run for `generation` of `uri`.
    pub fn schedule(
        &self,
        uri: Url,
        generation: u64,
        options: ParseOptions,
    ) -> JoinHandle<ParseOutcome> {
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.run(uri, generation, options).await })
    }

    pub async fn run(
        &self,
        uri: Url,
        generation: u64,
        options: ParseOptions,
    ) -> ParseOutcome {
        if !options.debounce.is_zero() {
            tokio::time::sleep(options.debounce).await;
        }

        let ticket = match self.store.begin_parse(&uri, generation).await {
            Ok(ticket) => ticket,
            Err(StoreError::UnknownDocument { .. }) => {
                debug!("Skipping parse of closed document {uri}");
                return ParseOutcome::Closed;
            },
            Err(err) => {
                debug!("Skipping parse: {err}");
                return ParseOutcome::Superseded;
            },
        };

        let version = ticket.version();
        let adapter = ParseAdapter::new(options.adapter.clone());
        let deadline = Instant::now() + options.timeout;
        let text = ticket.text();
        let is_cancelled = ticket.cancellation_check();
        let task_uri = uri.clone();
        let started = Instant::now();
        let result =
            tokio::task::spawn_blocking(move || adapter.parse(&task_uri, text, version, deadline, &is_cancelled)).await;

        match result {
            Ok(Ok(parse)) => {
                debug!("Parsed {uri} v{version} in {:?}", started.elapsed());
                self.commit(&ticket, Arc::new(parse), options.publish_diagnostics).await
            },
            Ok(Err(ParseAbort::Timeout)) => {
                warn!("Parse of {uri} v{version} exceeded {:?}; keeping the previous result", options.timeout);
                ticket.mark_timed_out().await;
                ParseOutcome::TimedOut
            },
            Ok(Err(ParseAbort::Cancelled)) => {
                debug!("Parse of {uri} v{version} cancelled by a newer edit");
                ParseOutcome::Superseded
            },
            Err(err) => {
                warn!("Parse task for {uri} v{version} failed: {err}");
                ParseOutcome::Failed
            },
        }
    }

    async fn commit(
        &self,
        ticket: &ParseTicket,
        parse: Arc<ParseResult>,
        publish_diagnostics: bool,
    ) -> ParseOutcome {
        let mut document = ticket.lock().await;
        if !ticket.is_current() {
            debug!("Discarding stale parse of {} v{}", ticket.uri(), parse.version_parsed);
            return ParseOutcome::Superseded;
        }

        document.commit(Arc::clone(&parse));
        ticket.announce(Arc::clone(&parse));

        let diagnostics = if publish_diagnostics {
            parse.diagnostics.iter().cloned().map(|diag| diag.into_lsp_diagnostic()).collect()
        } else {
            Vec::new()
        };
        debug!(
            "Publishing {} diagnostic(s) for {} (v{})",
            diagnostics.len(),
            ticket.uri(),
            parse.version_parsed
        );
        self.sink.publish(ticket.uri().clone(), diagnostics, Some(parse.version_parsed)).await;
        drop(document);
        ParseOutcome::Published
    }
}

#[cfg(test)]
#[path = "../../tests/src/analysis/scheduler_tests.rs"]
mod tests;
