//! Domain models shared across the gallery crates.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media;

// =============================================================================
// LOCAL FILES
// =============================================================================

/// A user-picked file: name, MIME type, and contents.
///
/// Cloning is cheap (`Bytes` is reference counted), which lets the tracker
/// hand the file to the uploader without holding its own lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Build a file from raw bytes, sniffing the MIME type from magic bytes
    /// and falling back to the file extension.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        let mime_type = media::detect_mime_type(&name, &data);
        Self {
            name,
            mime_type,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        media::is_image_mime(&self.mime_type)
    }
}

// =============================================================================
// UPLOAD ENTRIES
// =============================================================================

/// Upload lifecycle of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    /// `success` and `error` are terminal; only removal leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Uploading)
                | (Self::Uploading, Self::Success)
                | (Self::Uploading, Self::Error)
        )
    }

    /// Badge text shown next to the entry.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Uploading => "Uploading...",
            Self::Success => "Uploaded",
            Self::Error => "Failed",
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Read-only view of a tracked upload entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySnapshot {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub preview_url: String,
    pub status: UploadStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub categories: Vec<String>,
    pub copied: bool,
}

/// What the backend returns for one successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub key: String,
    pub url: String,
}

/// Outcome counts for one `upload_all_pending` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

// =============================================================================
// REMOTE FILES
// =============================================================================

/// A file that exists in the backing store, or a fixed gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileRecord {
    pub key: String,
    pub url: String,
    pub thumbnail_url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub is_immutable: bool,
}

impl RemoteFileRecord {
    /// A fixed entry with no size or upload date. It can be reordered but
    /// never deleted.
    pub fn immutable(key: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            key: key.into(),
            thumbnail_url: url.clone(),
            url,
            size: None,
            uploaded_at: None,
            categories: Vec::new(),
            original_name: None,
            is_immutable: true,
        }
    }

    /// Name to show for the record: the original upload name, or the last
    /// path segment of the key.
    pub fn display_name(&self) -> &str {
        match self.original_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.key.rsplit('/').next().unwrap_or(&self.key),
        }
    }
}

/// Load state of the gallery listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing has been fetched yet.
    #[default]
    Idle,
    /// A refresh is in flight.
    Loading,
    /// The last applied refresh succeeded.
    Ready,
    /// The last applied refresh failed; the message is shown with a retry.
    Failed(String),
}

// =============================================================================
// CATEGORIES
// =============================================================================

/// A gallery category. `title` is what entries are tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_default: bool,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient user notification (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Toast for a finished batch, if the batch did anything worth showing.
    pub fn for_batch(report: &BatchReport) -> Option<Self> {
        if report.is_empty() {
            return None;
        }
        if report.failed == 0 {
            Some(Self::success(format!(
                "Successfully uploaded {} file(s)!",
                report.succeeded
            )))
        } else if report.succeeded == 0 {
            Some(Self::error(format!(
                "Failed to upload {} file(s)",
                report.failed
            )))
        } else {
            Some(Self::error(format!(
                "Uploaded {} file(s), {} failed",
                report.succeeded, report.failed
            )))
        }
    }
}
