//! Centralized default constants for the gallery uploader.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// BACKEND
// =============================================================================

/// Default upload API base URL (local Worker dev server).
pub const API_URL: &str = "http://localhost:8787";

/// Header carrying the shared upload secret.
pub const AUTH_HEADER: &str = "X-Upload-Key";

/// Request timeout for directory calls in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Timeout for the health probe in seconds.
pub const HEALTH_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ENVIRONMENT VARIABLES (read only by the CLI)
// =============================================================================

pub const ENV_API_URL: &str = "GALLERY_API_URL";
pub const ENV_API_KEY: &str = "GALLERY_API_KEY";
pub const ENV_AUTH_HEADER: &str = "GALLERY_AUTH_HEADER";
pub const ENV_TIMEOUT_SECS: &str = "GALLERY_TIMEOUT_SECS";
pub const ENV_STATIC_ENTRIES: &str = "GALLERY_STATIC_ENTRIES";

// =============================================================================
// UPLOADS
// =============================================================================

/// Progress shown as soon as an entry starts uploading.
pub const INITIAL_UPLOAD_PROGRESS: u8 = 10;

/// Intermediate progress values reported by the HTTP client.
/// The transport gives no real progress, so these are simulated.
pub const SIMULATED_PROGRESS_STEPS: [u8; 2] = [30, 80];

/// Highest progress an entry may show while still uploading.
/// 100 is reserved for `success`.
pub const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// How long the "copied" flag stays set after copying an entry URL.
pub const COPIED_RESET_MS: u64 = 2000;

/// Category applied when the user has not selected any.
pub const DEFAULT_CATEGORY: &str = "Library";

// =============================================================================
// GESTURES
// =============================================================================

/// Touch hold duration before a long-press turns into a drag.
pub const TOUCH_HOLD_MS: u64 = 300;

/// Movement (px) before the hold fires that turns the touch into a scroll.
pub const TOUCH_MOVE_THRESHOLD_PX: f32 = 10.0;
