//! # gallery-core
//!
//! Core types, traits, and abstractions for the R2 gallery uploader.
//!
//! This crate provides the foundational data structures and capability
//! traits that the client, state, and CLI crates depend on.

pub mod categories;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod media;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use categories::{find_by_title, is_tagged_with};
pub use error::{Error, Result};
pub use media::{detect_mime_type, format_size, is_image_mime};
pub use models::*;
pub use traits::*;
