//! # gallery-state
//!
//! Client-side state for the gallery uploader:
//!
//! - [`UploadTracker`]: picked files and their sequential batch upload
//! - [`GalleryOrderEngine`]: stored files merged with fixed entries and the
//!   persisted order, with delete, reorder, and commit
//! - [`ReorderController`]: pointer and touch drag gestures that produce
//!   reorder moves
//! - [`CategoryCatalog`]: categories and the selection new uploads are
//!   tagged with
//!
//! All handles are cheap to clone and share state. Locks are never held
//! across an `.await`.

pub mod categories;
pub mod gallery;
pub mod merge;
pub mod preview;
pub mod reorder;
pub mod tracker;

pub use categories::CategoryCatalog;
pub use gallery::{GalleryOrderEngine, RefreshOutcome};
pub use merge::merge_order;
pub use preview::{InMemoryPreviewStore, PreviewHandle, PreviewStore};
pub use reorder::{GestureOutcome, GestureState, Modality, Point, Rect, ReorderController};
pub use tracker::{TrackerEvent, UploadEntry, UploadTracker};
