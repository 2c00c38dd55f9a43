//! Upload task tracker.
//!
//! Owns the user's picked files from selection until they are removed or
//! cleared, and drives the sequential batch upload:
//!
//! ```text
//! pending ──> uploading ──> success
//!                      └──> error
//! ```
//!
//! Terminal entries stay until the user removes them (or clears completed
//! ones); nothing is retried automatically.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use gallery_core::{
    defaults, BatchReport, DirectoryClient, EntrySnapshot, Error, Result, SourceFile, UploadStatus,
};

use crate::gallery::GalleryOrderEngine;
use crate::preview::{PreviewHandle, PreviewStore};

/// Capacity of the tracker event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification emitted by the tracker.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// An entry was added or changed.
    EntryChanged(EntrySnapshot),
    /// An entry was removed.
    EntryRemoved(Uuid),
    /// A batch finished.
    BatchFinished(BatchReport),
}

/// One picked file and its upload state.
#[derive(Debug)]
pub struct UploadEntry {
    id: Uuid,
    file: SourceFile,
    preview: PreviewHandle,
    status: UploadStatus,
    progress: u8,
    remote_url: Option<String>,
    error: Option<String>,
    categories: Vec<String>,
    copied: bool,
}

impl UploadEntry {
    fn new(file: SourceFile, categories: Vec<String>, previews: Arc<dyn PreviewStore>) -> Self {
        let preview = PreviewHandle::new(previews, &file);
        Self {
            id: Uuid::now_v7(),
            file,
            preview,
            status: UploadStatus::Pending,
            progress: 0,
            remote_url: None,
            error: None,
            categories,
            copied: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            id: self.id,
            name: self.file.name.clone(),
            size: self.file.size(),
            mime_type: self.file.mime_type.clone(),
            preview_url: self.preview.url().to_string(),
            status: self.status,
            progress: self.progress,
            remote_url: self.remote_url.clone(),
            error: self.error.clone(),
            categories: self.categories.clone(),
            copied: self.copied,
        }
    }

    fn transition(&mut self, next: UploadStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            warn!(entry_id = %self.id, from = %self.status, to = %next, "Rejected status transition");
            false
        }
    }
}

#[derive(Default)]
struct TrackerState {
    entries: Vec<UploadEntry>,
    batch_running: bool,
}

impl TrackerState {
    fn find_mut(&mut self, id: Uuid) -> Option<&mut UploadEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

/// Shared state plus the event channel; what background work needs to keep.
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<TrackerState>>,
    events: broadcast::Sender<TrackerEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TrackerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Apply `f` to the entry if it is still tracked and announce the change.
    fn update(&self, id: Uuid, f: impl FnOnce(&mut UploadEntry) -> bool) -> bool {
        let snapshot = {
            let mut state = self.lock();
            match state.find_mut(id) {
                Some(entry) => {
                    if !f(entry) {
                        return false;
                    }
                    entry.snapshot()
                }
                None => return false,
            }
        };
        self.emit(TrackerEvent::EntryChanged(snapshot));
        true
    }

    fn set_progress(&self, id: Uuid, progress: u8) {
        let capped = progress.min(defaults::MAX_IN_FLIGHT_PROGRESS);
        self.update(id, |entry| {
            if entry.status != UploadStatus::Uploading || capped <= entry.progress {
                return false;
            }
            entry.progress = capped;
            true
        });
    }
}

/// Clears the batch flag when the batch ends, including on cancellation.
struct BatchGuard(Shared);

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.0.lock().batch_running = false;
    }
}

/// Shared handle to the upload list. Clones see the same entries.
#[derive(Clone)]
pub struct UploadTracker {
    directory: Arc<dyn DirectoryClient>,
    previews: Arc<dyn PreviewStore>,
    refresh_target: Option<GalleryOrderEngine>,
    shared: Shared,
}

impl UploadTracker {
    pub fn new(directory: Arc<dyn DirectoryClient>, previews: Arc<dyn PreviewStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            directory,
            previews,
            refresh_target: None,
            shared: Shared {
                state: Arc::new(Mutex::new(TrackerState::default())),
                events,
            },
        }
    }

    /// Refresh `engine` in the background after every batch.
    pub fn with_refresh_target(mut self, engine: GalleryOrderEngine) -> Self {
        self.refresh_target = Some(engine);
        self
    }

    /// Subscribe to entry and batch changes.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.shared.events.subscribe()
    }

    /// Track `files` as pending uploads tagged with `categories`.
    ///
    /// Returns the new entry ids in the order the files were given.
    pub fn add_files(&self, files: Vec<SourceFile>, categories: &[String]) -> Vec<Uuid> {
        let entries: Vec<UploadEntry> = files
            .into_iter()
            .map(|file| UploadEntry::new(file, categories.to_vec(), self.previews.clone()))
            .collect();
        let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        let snapshots: Vec<EntrySnapshot> = entries.iter().map(UploadEntry::snapshot).collect();

        self.shared.lock().entries.extend(entries);

        for snapshot in snapshots {
            self.shared.emit(TrackerEvent::EntryChanged(snapshot));
        }
        debug!(result_count = ids.len(), "Added files");
        ids
    }

    /// Stop tracking an entry and release its preview. Unknown ids are ignored.
    pub fn remove_entry(&self, id: Uuid) {
        let removed = {
            let mut state = self.shared.lock();
            state
                .entries
                .iter()
                .position(|e| e.id == id)
                .map(|i| state.entries.remove(i))
        };
        if let Some(entry) = removed {
            drop(entry);
            self.shared.emit(TrackerEvent::EntryRemoved(id));
            debug!(entry_id = %id, "Removed entry");
        }
    }

    /// Drop every `success` entry, releasing their previews.
    ///
    /// Returns how many entries were removed.
    pub fn clear_completed(&self) -> usize {
        let removed: Vec<UploadEntry> = {
            let mut state = self.shared.lock();
            let (done, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut state.entries)
                .into_iter()
                .partition(|e| e.status == UploadStatus::Success);
            state.entries = keep;
            done
        };

        let count = removed.len();
        for entry in removed {
            let id = entry.id;
            drop(entry);
            self.shared.emit(TrackerEvent::EntryRemoved(id));
        }
        if count > 0 {
            debug!(result_count = count, "Cleared completed entries");
        }
        count
    }

    /// Mark an uploaded entry's URL as copied and return it.
    ///
    /// The copied flag resets after two seconds. Must be called from within
    /// a Tokio runtime. Returns `None` for unknown ids and entries without a
    /// URL.
    pub fn copy_url(&self, id: Uuid) -> Option<String> {
        let mut url = None;
        self.shared.update(id, |entry| {
            url = entry.remote_url.clone();
            if url.is_some() {
                entry.copied = true;
            }
            url.is_some()
        });
        let url = url?;

        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(defaults::COPIED_RESET_MS)).await;
            shared.update(id, |entry| {
                let was = entry.copied;
                entry.copied = false;
                was
            });
        });
        Some(url)
    }

    /// Upload every pending entry, one at a time, in list order.
    ///
    /// The set of entries is fixed when the batch starts. A failure marks its
    /// entry `error` and the batch moves on. When a refresh target is set, a
    /// gallery refresh is started after the batch without waiting for it.
    #[instrument(skip(self), fields(subsystem = "state", component = "tracker", op = "upload_all_pending"))]
    pub async fn upload_all_pending(&self) -> Result<BatchReport> {
        let start = Instant::now();
        let (pending, _guard) = {
            let mut state = self.shared.lock();
            let pending: Vec<(Uuid, SourceFile, Vec<String>)> = state
                .entries
                .iter()
                .filter(|e| e.status == UploadStatus::Pending)
                .map(|e| (e.id, e.file.clone(), e.categories.clone()))
                .collect();

            if pending.is_empty() {
                return Ok(BatchReport::default());
            }
            if !self.directory.is_configured() {
                return Err(Error::Config(format!(
                    "Upload API not configured. Please set {} and {}.",
                    defaults::ENV_API_URL,
                    defaults::ENV_API_KEY
                )));
            }
            if state.batch_running {
                return Err(Error::Validation(
                    "An upload batch is already running".to_string(),
                ));
            }
            state.batch_running = true;
            (pending, BatchGuard(self.shared.clone()))
        };

        info!(result_count = pending.len(), "Starting upload batch");
        let mut report = BatchReport::default();

        for (id, file, categories) in pending {
            let started = self.shared.update(id, |entry| {
                if !entry.transition(UploadStatus::Uploading) {
                    return false;
                }
                entry.progress = defaults::INITIAL_UPLOAD_PROGRESS;
                true
            });
            if !started {
                // Removed before its turn.
                continue;
            }
            report.attempted += 1;

            let sink = self.shared.clone();
            let on_progress = move |p: u8| sink.set_progress(id, p);

            match self.directory.upload_one(&file, &categories, &on_progress).await {
                Ok(receipt) => {
                    report.succeeded += 1;
                    let applied = self.shared.update(id, |entry| {
                        if !entry.transition(UploadStatus::Success) {
                            return false;
                        }
                        entry.progress = 100;
                        entry.remote_url = Some(receipt.url);
                        true
                    });
                    debug!(entry_id = %id, key = %receipt.key, applied, "Upload succeeded");
                }
                Err(e) => {
                    report.failed += 1;
                    let message = e.to_string();
                    warn!(entry_id = %id, error = %message, "Upload failed");
                    self.shared.update(id, |entry| {
                        if !entry.transition(UploadStatus::Error) {
                            return false;
                        }
                        entry.error = Some(message);
                        true
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload batch finished"
        );
        self.shared.emit(TrackerEvent::BatchFinished(report));

        if let Some(engine) = self.refresh_target.clone() {
            tokio::spawn(async move {
                if let Err(e) = engine.refresh().await {
                    warn!(error = %e, "Gallery refresh after upload failed");
                }
            });
        }

        Ok(report)
    }

    /// Every tracked entry, in list order.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.shared
            .lock()
            .entries
            .iter()
            .map(UploadEntry::snapshot)
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<EntrySnapshot> {
        self.shared
            .lock()
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(UploadEntry::snapshot)
    }

    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.count(UploadStatus::Pending)
    }

    pub fn success_count(&self) -> usize {
        self.count(UploadStatus::Success)
    }

    /// Whether a batch is running.
    pub fn is_uploading(&self) -> bool {
        self.shared.lock().batch_running
    }

    fn count(&self, status: UploadStatus) -> usize {
        self.shared
            .lock()
            .entries
            .iter()
            .filter(|e| e.status == status)
            .count()
    }
}
