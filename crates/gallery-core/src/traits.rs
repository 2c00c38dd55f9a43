//! Capability traits for the remote file directory.
//!
//! The directory is split the way the backend is: files, the persisted
//! gallery order, and categories. [`DirectoryClient`] is the union that the
//! tracker and gallery engine hold.

use async_trait::async_trait;

use crate::models::{Category, RemoteFileRecord, SourceFile, UploadReceipt};
use crate::Result;

/// Upload progress callback. Receives percentages in `0..=100`.
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Files stored in the backing bucket.
#[async_trait]
pub trait FileDirectory: Send + Sync {
    /// Whether an endpoint and credentials are set. Callers check this
    /// before starting work that would otherwise fail on every request.
    fn is_configured(&self) -> bool;

    /// List every stored file.
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>>;

    /// Delete one stored file by key.
    async fn delete_file(&self, key: &str) -> Result<()>;

    /// Upload one file tagged with `categories`.
    ///
    /// `on_progress` is called with increasing values and receives 100 as
    /// its last call before a successful return. Intermediate values carry
    /// no meaning beyond ordering.
    async fn upload_one(
        &self,
        file: &SourceFile,
        categories: &[String],
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt>;

    /// Probe the backend. Transport failures report `Ok(false)`.
    async fn health_check(&self) -> Result<bool>;
}

/// The persisted manual display order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Last saved order of file keys (empty when never saved).
    async fn get_persisted_order(&self) -> Result<Vec<String>>;

    /// Replace the saved order.
    async fn save_persisted_order(&self, order: &[String]) -> Result<()>;
}

/// Category CRUD.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Create a category. Title collisions fail with `Error::Duplicate`.
    async fn create_category(&self, title: &str) -> Result<Category>;

    /// Delete a category. Default categories fail with `Error::Forbidden`.
    async fn delete_category(&self, id: &str) -> Result<()>;

    /// Persist a new category order, returning the stored list.
    async fn reorder_categories(&self, ids: &[String]) -> Result<Vec<Category>>;
}

/// Full directory capability set.
pub trait DirectoryClient: FileDirectory + OrderStore + CategoryStore {}

impl<T: FileDirectory + OrderStore + CategoryStore> DirectoryClient for T {}
