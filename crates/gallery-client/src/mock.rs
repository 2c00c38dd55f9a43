//! In-memory directory client for deterministic testing.
//!
//! Behaves like the upload API (uploads appear in the listing, categories
//! enforce title uniqueness and protect defaults) and adds knobs tests need:
//! scripted failures, gated upload completion, listing delays, and a call log.
//!
//! ## Usage
//!
//! ```rust
//! use gallery_client::MockDirectoryClient;
//! use gallery_core::{FileDirectory, SourceFile};
//!
//! #[tokio::test]
//! async fn test_with_mock_directory() {
//!     let mock = MockDirectoryClient::new().with_upload_failure("b.png", "disk full");
//!     let file = SourceFile::new("b.png", "image/png", vec![0u8; 4]);
//!     let err = mock.upload_one(&file, &[], &|_| {}).await.unwrap_err();
//!     assert_eq!(err.to_string(), "disk full");
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use gallery_core::{
    defaults, Category, CategoryStore, Error, FileDirectory, OrderStore, ProgressFn,
    RemoteFileRecord, Result, SourceFile, UploadReceipt,
};

/// Base URL used for records the mock creates.
pub const MOCK_CDN: &str = "https://cdn.test";

/// One call made against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListFiles,
    DeleteFile(String),
    Upload(String),
    GetOrder,
    SaveOrder(Vec<String>),
    ListCategories,
    CreateCategory(String),
    DeleteCategory(String),
    ReorderCategories(Vec<String>),
    HealthCheck,
}

#[derive(Default)]
struct MockState {
    unconfigured: AtomicBool,
    unhealthy: AtomicBool,
    files: Mutex<Vec<RemoteFileRecord>>,
    order: Mutex<Vec<String>>,
    categories: Mutex<Vec<Category>>,
    upload_failures: Mutex<HashMap<String, String>>,
    list_failure: Mutex<Option<String>>,
    order_fetch_failure: Mutex<Option<String>>,
    order_save_failure: Mutex<Option<String>>,
    delete_failure: Mutex<Option<String>>,
    list_delays: Mutex<VecDeque<Duration>>,
    upload_gate: Mutex<Option<Arc<Semaphore>>>,
    uploads_in_flight: AtomicUsize,
    max_uploads_in_flight: AtomicUsize,
    next_category_id: AtomicUsize,
    calls: Mutex<Vec<MockCall>>,
}

/// Mock directory client. Clones share state, so a test can keep a handle
/// while the code under test owns another.
#[derive(Clone)]
pub struct MockDirectoryClient {
    state: Arc<MockState>,
}

impl Default for MockDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDirectoryClient {
    /// Configured mock with one default `Library` category and no files.
    pub fn new() -> Self {
        let mock = Self {
            state: Arc::new(MockState::default()),
        };
        mock.state.categories.lock().unwrap().push(Category {
            id: "cat-0".to_string(),
            title: defaults::DEFAULT_CATEGORY.to_string(),
            is_default: true,
        });
        mock.state.next_category_id.store(1, Ordering::SeqCst);
        mock
    }

    /// A record as the mock would list it after uploading `name`.
    pub fn record(name: &str) -> RemoteFileRecord {
        let key = format!("gallery/{}", name);
        let url = format!("{}/{}", MOCK_CDN, key);
        RemoteFileRecord {
            key,
            thumbnail_url: url.clone(),
            url,
            size: Some(0),
            uploaded_at: None,
            categories: vec![defaults::DEFAULT_CATEGORY.to_string()],
            original_name: Some(name.to_string()),
            is_immutable: false,
        }
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Report "not configured".
    pub fn unconfigured(self) -> Self {
        self.state.unconfigured.store(true, Ordering::SeqCst);
        self
    }

    /// Seed the listing with records for `names` (see [`Self::record`]).
    pub fn with_files(self, names: &[&str]) -> Self {
        self.set_files(names.iter().map(|n| Self::record(n)).collect());
        self
    }

    pub fn with_records(self, records: Vec<RemoteFileRecord>) -> Self {
        self.set_files(records);
        self
    }

    pub fn with_order(self, keys: &[&str]) -> Self {
        *self.state.order.lock().unwrap() = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.set_categories(categories);
        self
    }

    /// Make uploads of the file named `name` fail with `message`.
    pub fn with_upload_failure(self, name: &str, message: &str) -> Self {
        self.state
            .upload_failures
            .lock()
            .unwrap()
            .insert(name.to_string(), message.to_string());
        self
    }

    /// Hold every upload until [`Self::release_upload`] is called.
    pub fn with_upload_gate(self) -> Self {
        *self.state.upload_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
        self
    }

    // ------------------------------------------------------------------
    // Runtime knobs
    // ------------------------------------------------------------------

    pub fn set_files(&self, records: Vec<RemoteFileRecord>) {
        *self.state.files.lock().unwrap() = records;
    }

    /// Replace the stored categories. Ids handed out by later creates never
    /// go backwards.
    pub fn set_categories(&self, categories: Vec<Category>) {
        let next = categories.len();
        *self.state.categories.lock().unwrap() = categories;
        self.state.next_category_id.fetch_max(next, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.state.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    pub fn set_list_failure(&self, message: Option<&str>) {
        *self.state.list_failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn set_order_fetch_failure(&self, message: Option<&str>) {
        *self.state.order_fetch_failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn set_order_save_failure(&self, message: Option<&str>) {
        *self.state.order_save_failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn set_delete_failure(&self, message: Option<&str>) {
        *self.state.delete_failure.lock().unwrap() = message.map(str::to_string);
    }

    /// Delay the next listing call (snapshot taken before the delay).
    pub fn push_list_delay(&self, delay: Duration) {
        self.state.list_delays.lock().unwrap().push_back(delay);
    }

    /// Let one gated upload finish.
    pub fn release_upload(&self) {
        if let Some(gate) = self.state.upload_gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.lock().unwrap().clear()
    }

    pub fn upload_call_count(&self) -> usize {
        self.count_calls(|c| matches!(c, MockCall::Upload(_)))
    }

    pub fn count_calls(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Highest number of uploads observed running at once.
    pub fn max_uploads_in_flight(&self) -> usize {
        self.state.max_uploads_in_flight.load(Ordering::SeqCst)
    }

    pub fn saved_order(&self) -> Vec<String> {
        self.state.order.lock().unwrap().clone()
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.state
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.key.clone())
            .collect()
    }

    pub fn stored_categories(&self) -> Vec<Category> {
        self.state.categories.lock().unwrap().clone()
    }

    fn log(&self, call: MockCall) {
        self.state.calls.lock().unwrap().push(call);
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.state.unconfigured.load(Ordering::SeqCst) {
            Err(Error::Config("Upload API not configured".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Tracks concurrently running uploads for the lifetime of one call.
struct InFlight<'a>(&'a MockState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a MockState) -> Self {
        let now = state.uploads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_uploads_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.uploads_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileDirectory for MockDirectoryClient {
    fn is_configured(&self) -> bool {
        !self.state.unconfigured.load(Ordering::SeqCst)
    }

    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>> {
        self.log(MockCall::ListFiles);
        self.ensure_configured()?;

        let failure = self.state.list_failure.lock().unwrap().clone();
        let snapshot = self.state.files.lock().unwrap().clone();
        let delay = self.state.list_delays.lock().unwrap().pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(Error::Connectivity(message)),
            None => Ok(snapshot),
        }
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.log(MockCall::DeleteFile(key.to_string()));
        self.ensure_configured()?;

        if let Some(message) = self.state.delete_failure.lock().unwrap().clone() {
            return Err(Error::remote(500, message));
        }

        let mut files = self.state.files.lock().unwrap();
        let before = files.len();
        files.retain(|r| r.key != key);
        if files.len() == before {
            return Err(Error::NotFound("File not found".to_string()));
        }
        Ok(())
    }

    async fn upload_one(
        &self,
        file: &SourceFile,
        categories: &[String],
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt> {
        self.log(MockCall::Upload(file.name.clone()));
        self.ensure_configured()?;
        let _in_flight = InFlight::enter(&self.state);

        on_progress(defaults::INITIAL_UPLOAD_PROGRESS);
        on_progress(defaults::SIMULATED_PROGRESS_STEPS[0]);

        let gate = self.state.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|_| Error::Connectivity("upload gate closed".to_string()))?
                .forget();
        }

        on_progress(defaults::SIMULATED_PROGRESS_STEPS[1]);

        let failure = self.state.upload_failures.lock().unwrap().get(&file.name).cloned();
        if let Some(message) = failure {
            return Err(Error::remote(500, message));
        }

        let mut record = Self::record(&file.name);
        record.size = Some(file.size());
        if !categories.is_empty() {
            record.categories = categories.to_vec();
        }
        let receipt = UploadReceipt {
            key: record.key.clone(),
            url: record.url.clone(),
        };

        {
            let mut files = self.state.files.lock().unwrap();
            files.retain(|r| r.key != record.key);
            files.push(record);
        }

        on_progress(100);
        Ok(receipt)
    }

    async fn health_check(&self) -> Result<bool> {
        self.log(MockCall::HealthCheck);
        Ok(!self.state.unhealthy.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl OrderStore for MockDirectoryClient {
    async fn get_persisted_order(&self) -> Result<Vec<String>> {
        self.log(MockCall::GetOrder);
        self.ensure_configured()?;
        if let Some(message) = self.state.order_fetch_failure.lock().unwrap().clone() {
            return Err(Error::remote(500, message));
        }
        Ok(self.state.order.lock().unwrap().clone())
    }

    async fn save_persisted_order(&self, order: &[String]) -> Result<()> {
        self.log(MockCall::SaveOrder(order.to_vec()));
        self.ensure_configured()?;
        if let Some(message) = self.state.order_save_failure.lock().unwrap().clone() {
            return Err(Error::remote(500, message));
        }
        *self.state.order.lock().unwrap() = order.to_vec();
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MockDirectoryClient {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.log(MockCall::ListCategories);
        self.ensure_configured()?;
        Ok(self.state.categories.lock().unwrap().clone())
    }

    async fn create_category(&self, title: &str) -> Result<Category> {
        self.log(MockCall::CreateCategory(title.to_string()));
        self.ensure_configured()?;

        let mut categories = self.state.categories.lock().unwrap();
        if categories.iter().any(|c| c.title == title) {
            return Err(Error::Duplicate(format!("Category '{}' already exists", title)));
        }
        let n = self.state.next_category_id.fetch_add(1, Ordering::SeqCst);
        let category = Category {
            id: format!("cat-{}", n),
            title: title.to_string(),
            is_default: false,
        };
        categories.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<()> {
        self.log(MockCall::DeleteCategory(id.to_string()));
        self.ensure_configured()?;

        let mut categories = self.state.categories.lock().unwrap();
        match categories.iter().position(|c| c.id == id) {
            None => Err(Error::NotFound("Category not found".to_string())),
            Some(i) if categories[i].is_default => Err(Error::Forbidden(
                "Default categories cannot be deleted".to_string(),
            )),
            Some(i) => {
                categories.remove(i);
                Ok(())
            }
        }
    }

    async fn reorder_categories(&self, ids: &[String]) -> Result<Vec<Category>> {
        self.log(MockCall::ReorderCategories(ids.to_vec()));
        self.ensure_configured()?;

        let mut categories = self.state.categories.lock().unwrap();
        let mut pool = std::mem::take(&mut *categories);
        for id in ids {
            if let Some(i) = pool.iter().position(|c| &c.id == id) {
                categories.push(pool.remove(i));
            }
        }
        categories.extend(pool);
        Ok(categories.clone())
    }
}
