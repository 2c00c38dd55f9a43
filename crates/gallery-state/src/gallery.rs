//! Gallery order engine.
//!
//! Holds the displayed sequence of stored files plus fixed entries, the
//! last committed order (baseline), and the load state of the listing.
//! Refreshes are numbered; only the most recently requested refresh may
//! apply its result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use gallery_core::{DirectoryClient, Error, LoadState, RemoteFileRecord, Result};

use crate::merge::{keys_of, merge_order};

/// What happened to a refresh's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result replaced the displayed sequence.
    Applied,
    /// A newer refresh was requested while this one was in flight; the
    /// result was discarded.
    Superseded,
}

#[derive(Default)]
struct GalleryState {
    items: Vec<RemoteFileRecord>,
    baseline: Vec<String>,
    dirty: bool,
    load_state: LoadState,
    latest_generation: u64,
}

impl GalleryState {
    fn keys(&self) -> Vec<String> {
        keys_of(&self.items)
    }

    fn differs_from_baseline(&self) -> bool {
        self.items.len() != self.baseline.len()
            || self.items.iter().zip(&self.baseline).any(|(r, k)| &r.key != k)
    }
}

/// Shared handle to the gallery sequence. Clones see the same state.
#[derive(Clone)]
pub struct GalleryOrderEngine {
    directory: Arc<dyn DirectoryClient>,
    immutable: Arc<[RemoteFileRecord]>,
    state: Arc<Mutex<GalleryState>>,
}

impl GalleryOrderEngine {
    /// Create an engine over `directory` with a fixed set of entries that
    /// can be reordered but never deleted.
    pub fn new(directory: Arc<dyn DirectoryClient>, immutable: Vec<RemoteFileRecord>) -> Self {
        let immutable: Vec<RemoteFileRecord> = immutable
            .into_iter()
            .map(|mut r| {
                r.is_immutable = true;
                r
            })
            .collect();
        Self {
            directory,
            immutable: immutable.into(),
            state: Arc::new(Mutex::new(GalleryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GalleryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-fetch the listing and persisted order and recompute the sequence.
    ///
    /// A failed order fetch degrades to "no saved order". A failed listing
    /// leaves the current sequence in place and records
    /// [`LoadState::Failed`]. Either way the result is dropped if a newer
    /// refresh has been requested in the meantime.
    #[instrument(skip(self), fields(subsystem = "state", component = "gallery", op = "refresh", generation = tracing::field::Empty))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let start = Instant::now();
        let generation = {
            let mut state = self.lock();
            state.latest_generation += 1;
            state.load_state = LoadState::Loading;
            state.latest_generation
        };
        tracing::Span::current().record("generation", generation);

        let (listing, order) = tokio::join!(
            self.directory.list_files(),
            self.directory.get_persisted_order()
        );

        let order = order.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load gallery order, using listing order");
            Vec::new()
        });

        let mut state = self.lock();
        if generation != state.latest_generation {
            debug!(
                latest = state.latest_generation,
                "Discarding superseded refresh"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        match listing {
            Ok(records) => {
                let merged = merge_order(records, &self.immutable, &order);
                state.baseline = keys_of(&merged);
                state.items = merged;
                state.dirty = false;
                state.load_state = LoadState::Ready;
                info!(
                    result_count = state.items.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Gallery refreshed"
                );
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Gallery listing failed");
                state.load_state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Delete a stored file and drop it from the sequence.
    ///
    /// Fixed entries are rejected without contacting the backend.
    #[instrument(skip(self), fields(subsystem = "state", component = "gallery", op = "delete"))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        {
            let state = self.lock();
            match state.items.iter().find(|r| r.key == key) {
                None => {
                    return Err(Error::Validation(format!("Unknown gallery entry: {}", key)));
                }
                Some(record) if record.is_immutable => {
                    return Err(Error::Forbidden(format!(
                        "'{}' is a fixed gallery entry and cannot be deleted",
                        record.display_name()
                    )));
                }
                Some(_) => {}
            }
        }

        self.directory.delete_file(key).await?;

        let mut state = self.lock();
        state.items.retain(|r| r.key != key);
        state.dirty = true;
        info!(remaining = state.items.len(), "Deleted gallery entry");
        Ok(())
    }

    /// Move the item at `from` so it ends up at `to`.
    pub fn reorder(&self, from: usize, to: usize) -> Result<()> {
        let mut state = self.lock();
        let len = state.items.len();
        if from >= len || to >= len {
            return Err(Error::Validation(format!(
                "Reorder index out of range: {} -> {} (len {})",
                from, to, len
            )));
        }
        if from != to {
            let item = state.items.remove(from);
            state.items.insert(to, item);
        }
        state.dirty = state.differs_from_baseline();
        debug!(from, to, dirty = state.dirty, "Reordered gallery");
        Ok(())
    }

    /// Persist the current key sequence as the gallery order.
    ///
    /// On failure the sequence and dirty flag are left as they were.
    #[instrument(skip(self), fields(subsystem = "state", component = "gallery", op = "commit"))]
    pub async fn commit(&self) -> Result<()> {
        let keys = self.keys();

        if let Err(e) = self.directory.save_persisted_order(&keys).await {
            warn!(error = %e, "Failed to save gallery order");
            return Err(e);
        }

        let mut state = self.lock();
        state.baseline = keys;
        state.dirty = state.differs_from_baseline();
        info!(result_count = state.baseline.len(), "Gallery order saved");
        Ok(())
    }

    /// The displayed sequence.
    pub fn items(&self) -> Vec<RemoteFileRecord> {
        self.lock().items.clone()
    }

    pub fn get(&self, key: &str) -> Option<RemoteFileRecord> {
        self.lock().items.iter().find(|r| r.key == key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Key sequence of the last successful refresh or commit.
    pub fn baseline(&self) -> Vec<String> {
        self.lock().baseline.clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}
