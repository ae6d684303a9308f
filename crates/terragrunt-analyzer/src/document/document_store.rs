use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, watch};
use tower_lsp::lsp_types::Url;

use super::{Document, DocumentState};
use crate::analysis::ParseResult;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("stale version {received} for {uri} (current is {current})")]
    StaleVersion { uri: Url, current: i32, received: i32 },
    #[error("document {uri} is not open")]
    UnknownDocument { uri: Url },
    #[error("parse generation {generation} of {uri} was superseded")]
    Superseded { uri: Url, generation: u64 },
}

/// One open document plus the state its parse worker coordinates on.
#[derive(Debug)]
struct DocumentSlot {
    document: Mutex<Document>,
    /// Latest accepted generation. Any run holding an older one is stale.
    generation: AtomicU64,
    results: watch::Sender<Option<Arc<ParseResult>>>,
}

impl DocumentSlot {
    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Thread-safe store of all open documents.
///
/// Every document sits behind its own async mutex inside a `DashMap`, so
/// different URIs never contend and operations on one URI serialize. Each
/// accepted `open`/`update` advances the document's parse generation, which
/// schedules a new parse and cancels the one in flight; `close` advances it
/// too.
#[derive(Debug)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<DocumentSlot>>,
    next_generation: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    fn allocate_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Clone the slot out so no map shard lock is held across an await.
    fn slot(
        &self,
        uri: &Url,
    ) -> Option<Arc<DocumentSlot>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    /// Open (register) a document, replacing any previous buffer for `uri`.
    /// Returns the generation to parse.
    ///
    /// A replaced buffer is retired like `close` retires one: once this
    /// returns, no commit for it is in progress and none can start.
    pub async fn open(
        &self,
        uri: Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> u64 {
        let generation = self.allocate_generation();
        let (results, _) = watch::channel(None);
        let slot = Arc::new(DocumentSlot {
            document: Mutex::new(Document::new(uri.clone(), text, version)),
            generation: AtomicU64::new(generation),
            results,
        });
        if let Some(previous) = self.documents.insert(uri, slot) {
            let _document = previous.document.lock().await;
            previous.generation.store(self.allocate_generation(), Ordering::Release);
        }
        generation
    }

    /// Replace the full content of an open document.
    ///
    /// Fails without touching the document when `version` does not advance.
    pub async fn update(
        &self,
        uri: &Url,
        text: impl Into<Arc<str>>,
        version: i32,
    ) -> Result<u64, StoreError> {
        let slot = self.slot(uri).ok_or_else(|| StoreError::UnknownDocument {
            uri: uri.clone(),
        })?;
        let mut document = slot.document.lock().await;
        if version <= document.version {
            return Err(StoreError::StaleVersion {
                uri: uri.clone(),
                current: document.version,
                received: version,
            });
        }
        document.set_content(text, version);
        let generation = self.allocate_generation();
        slot.generation.store(generation, Ordering::Release);
        Ok(generation)
    }

    /// Request a fresh parse of the current text, e.g. after a settings
    /// change. The version is unchanged.
    pub async fn refresh(
        &self,
        uri: &Url,
    ) -> Result<u64, StoreError> {
        let slot = self.slot(uri).ok_or_else(|| StoreError::UnknownDocument {
            uri: uri.clone(),
        })?;
        let mut document = slot.document.lock().await;
        document.state = DocumentState::Parsing;
        let generation = self.allocate_generation();
        slot.generation.store(generation, Ordering::Release);
        Ok(generation)
    }

    /// Close (unregister) a document. In-flight parses become stale.
    pub async fn close(
        &self,
        uri: &Url,
    ) -> bool {
        let Some((_, slot)) = self.documents.remove(uri) else {
            return false;
        };
        let _document = slot.document.lock().await;
        slot.generation.store(self.allocate_generation(), Ordering::Release);
        true
    }

    /// Return a clone of the full `Document`, if the URI is tracked.
    pub async fn get(
        &self,
        uri: &Url,
    ) -> Option<Document> {
        let slot = self.slot(uri)?;
        let document = slot.document.lock().await;
        Some(document.clone())
    }

    pub fn contains(
        &self,
        uri: &Url,
    ) -> bool {
        self.documents.contains_key(uri)
    }

    /// Return all currently open document URIs.
    pub fn all_uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn is_current(
        &self,
        uri: &Url,
        generation: u64,
    ) -> bool {
        self.documents.get(uri).is_some_and(|slot| slot.current_generation() == generation)
    }

    /// Receiver of committed parse results for `uri`.
    pub fn subscribe(
        &self,
        uri: &Url,
    ) -> Option<watch::Receiver<Option<Arc<ParseResult>>>> {
        self.slot(uri).map(|slot| slot.results.subscribe())
    }

    /// Snapshot the text of `generation` for parsing.
    pub async fn begin_parse(
        &self,
        uri: &Url,
        generation: u64,
    ) -> Result<ParseTicket, StoreError> {
        let slot = self.slot(uri).ok_or_else(|| StoreError::UnknownDocument {
            uri: uri.clone(),
        })?;
        let document = slot.document.lock().await;
        if slot.current_generation() != generation {
            return Err(StoreError::Superseded {
                uri: uri.clone(),
                generation,
            });
        }
        let text = Arc::clone(&document.text);
        let version = document.version;
        drop(document);
        Ok(ParseTicket {
            uri: uri.clone(),
            generation,
            version,
            text,
            slot,
        })
    }

    /// The committed parse to answer a query from.
    ///
    /// When the current text is still being parsed, waits up to `grace` for
    /// that parse to commit, then falls back to the previous result.
    pub async fn settled_parse(
        &self,
        uri: &Url,
        grace: Duration,
    ) -> Option<Arc<ParseResult>> {
        let slot = self.slot(uri)?;
        let (version, state) = {
            let document = slot.document.lock().await;
            (document.version, document.state)
        };
        let mut rx = slot.results.subscribe();
        let is_settled =
            |parse: &Option<Arc<ParseResult>>| parse.as_ref().is_some_and(|parse| parse.version_parsed >= version);

        if state == DocumentState::Parsing && !is_settled(&rx.borrow()) && !grace.is_zero() {
            let wait = async {
                while rx.changed().await.is_ok() {
                    if is_settled(&rx.borrow_and_update()) {
                        break;
                    }
                }
            };
            let _ = tokio::time::timeout(grace, wait).await;
        }
        rx.borrow().clone()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Permission to commit one parse of one document version.
#[derive(Debug)]
pub struct ParseTicket {
    uri: Url,
    generation: u64,
    version: i32,
    text: Arc<str>,
    slot: Arc<DocumentSlot>,
}

impl ParseTicket {
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Still the latest generation of its document.
    pub fn is_current(&self) -> bool {
        self.slot.current_generation() == self.generation
    }

    /// Cancellation check for the blocking parse.
    pub fn cancellation_check(&self) -> impl Fn() -> bool + Send + Sync + 'static {
        let slot = Arc::clone(&self.slot);
        let generation = self.generation;
        move || slot.current_generation() != generation
    }

    pub async fn lock(&self) -> MutexGuard<'_, Document> {
        self.slot.document.lock().await
    }

    /// Publish a committed result to `settled_parse` waiters.
    pub fn announce(
        &self,
        parse: Arc<ParseResult>,
    ) {
        self.slot.results.send_replace(Some(parse));
    }

    pub async fn mark_timed_out(&self) {
        let mut document = self.slot.document.lock().await;
        if self.is_current() {
            document.mark_timed_out();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/document/document_store_tests.rs"]
mod tests;
