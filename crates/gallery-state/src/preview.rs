//! Local preview references for picked files.
//!
//! A [`PreviewHandle`] is owned by exactly one upload entry and revokes its
//! reference when dropped, so every path that discards an entry (removal,
//! clearing, tracker teardown) releases the preview once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use gallery_core::SourceFile;
use tracing::trace;

/// Creates and revokes preview references.
pub trait PreviewStore: Send + Sync {
    /// Create a preview reference for `file`.
    fn create(&self, file: &SourceFile) -> String;

    /// Release a reference previously returned by [`PreviewStore::create`].
    fn revoke(&self, url: &str);
}

/// Owned preview reference. Revoked on drop.
pub struct PreviewHandle {
    url: String,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn new(store: Arc<dyn PreviewStore>, file: &SourceFile) -> Self {
        let url = store.create(file);
        Self { url, store }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        trace!(url = %self.url, "Revoking preview");
        self.store.revoke(&self.url);
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

/// Preview store that hands out `preview://` references and keeps a ledger
/// of what is live and what was revoked.
#[derive(Default)]
pub struct InMemoryPreviewStore {
    next_id: AtomicU64,
    ledger: Mutex<Ledger>,
}

#[derive(Default)]
struct Ledger {
    live: HashSet<String>,
    revoked: Vec<String>,
}

impl InMemoryPreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// References created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.ledger().live.len()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.ledger().live.contains(url)
    }

    /// Every revocation in call order, duplicates included.
    pub fn revoked(&self) -> Vec<String> {
        self.ledger().revoked.clone()
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreviewStore for InMemoryPreviewStore {
    fn create(&self, file: &SourceFile) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("preview://{}/{}", id, file.name);
        self.ledger().live.insert(url.clone());
        url
    }

    fn revoke(&self, url: &str) {
        let mut ledger = self.ledger();
        ledger.live.remove(url);
        ledger.revoked.push(url.to_string());
    }
}
