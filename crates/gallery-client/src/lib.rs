//! # gallery-client
//!
//! Remote file directory clients for the gallery uploader.
//!
//! This crate provides:
//! - [`HttpDirectoryClient`], talking to the upload Worker API over HTTP
//! - [`ClientConfig`], the explicit configuration the client is built from
//! - HTTP status → [`gallery_core::Error`] mapping
//! - `MockDirectoryClient` (feature `mock`), an in-memory directory for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use gallery_client::{ClientConfig, HttpDirectoryClient};
//! use gallery_core::FileDirectory;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::new("https://uploads.example.workers.dev")
//!         .with_api_key("secret");
//!     let client = HttpDirectoryClient::new(config).unwrap();
//!     let files = client.list_files().await.unwrap();
//!     println!("{} file(s)", files.len());
//! }
//! ```

mod config;
mod error;
mod http;
mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::ClientConfig;
pub use error::{to_gallery_error, ApiErrorCode};
pub use http::HttpDirectoryClient;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockDirectoryClient};
