//! Structured logging field name constants.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log tooling can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and the user sees an error |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Batch/refresh/commit completions |
//! | DEBUG | Decision points, per-entry transitions |
//! | TRACE | Per-item iteration (progress ticks, hit tests) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "client", "state", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "http", "tracker", "gallery", "categories"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list_files", "upload_one", "refresh", "commit"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Upload entry id.
pub const ENTRY_ID: &str = "entry_id";

/// Remote file key.
pub const KEY: &str = "key";

/// Category id or title.
pub const CATEGORY: &str = "category";

/// Refresh generation number.
pub const GENERATION: &str = "generation";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned by a listing.
pub const RESULT_COUNT: &str = "result_count";

/// Upload progress percentage.
pub const PROGRESS: &str = "progress";

/// Size in bytes of an uploaded file.
pub const SIZE_BYTES: &str = "size_bytes";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
