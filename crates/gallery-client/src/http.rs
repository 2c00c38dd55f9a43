//! HTTP directory client for the upload Worker API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use gallery_core::{
    defaults, CategoryStore, Category, Error, FileDirectory, OrderStore, ProgressFn,
    RemoteFileRecord, Result, SourceFile, UploadReceipt,
};

use crate::config::ClientConfig;
use crate::error::{connectivity_error, to_gallery_error};
use crate::types::{
    CategoriesResponse, CategoryResponse, CreateCategoryRequest, ErrorBody, FilesResponse,
    OrderBody, UploadResponse,
};

/// Directory client backed by the upload API.
pub struct HttpDirectoryClient {
    client: Client,
    config: ClientConfig,
}

impl HttpDirectoryClient {
    /// Create a client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            url = %config.base_url,
            has_api_key = config.api_key.is_some(),
            "Initializing directory client"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a request with the shared secret attached if configured.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.client.request(method, self.config.url(path));
        if let Some(ref key) = self.config.api_key {
            req = req.header(self.config.auth_header.as_str(), key);
        }
        req
    }

    /// Fail before any network attempt when the endpoint or key is unset.
    fn ensure_configured(&self) -> Result<()> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "Upload API not configured. Please set {} and {}.",
                defaults::ENV_API_URL,
                defaults::ENV_API_KEY
            )))
        }
    }

    /// Send a request and turn non-2xx responses into errors.
    async fn send(&self, req: RequestBuilder, op: &str) -> Result<Response> {
        let response = req.send().await.map_err(connectivity_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("{} failed with status {}", op, status.as_u16()));

        warn!(op, status = status.as_u16(), error = %message, "Directory call failed");
        Err(to_gallery_error(status.as_u16(), &message))
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, op: &str) -> Result<T> {
        let response = self.send(req, op).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse {} response: {}", op, e)))
    }
}

/// Percent-encode each segment of a path-like key, keeping the slashes.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl FileDirectory for HttpDirectoryClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "http", op = "list_files"))]
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>> {
        self.ensure_configured()?;
        let start = Instant::now();

        let response: FilesResponse = self
            .send_json(self.request(Method::GET, "/files"), "List files")
            .await?;

        let records: Vec<RemoteFileRecord> =
            response.files.into_iter().map(RemoteFileRecord::from).collect();

        if let Some(count) = response.count {
            if count != records.len() {
                debug!(count, result_count = records.len(), "Listing count mismatch");
            }
        }
        debug!(
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed files"
        );
        Ok(records)
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "http", op = "delete_file"))]
    async fn delete_file(&self, key: &str) -> Result<()> {
        self.ensure_configured()?;
        let path = format!("/files/{}", encode_key(key));
        self.send(self.request(Method::DELETE, &path), "Delete")
            .await?;
        info!(key, "Deleted file");
        Ok(())
    }

    #[instrument(skip(self, file, on_progress), fields(subsystem = "client", component = "http", op = "upload_one", name = %file.name, size_bytes = file.size()))]
    async fn upload_one(
        &self,
        file: &SourceFile,
        categories: &[String],
        on_progress: &ProgressFn,
    ) -> Result<UploadReceipt> {
        self.ensure_configured()?;
        let start = Instant::now();
        let [mid, late] = defaults::SIMULATED_PROGRESS_STEPS;

        on_progress(defaults::INITIAL_UPLOAD_PROGRESS);

        let categories: Vec<&str> = if categories.is_empty() {
            vec![defaults::DEFAULT_CATEGORY]
        } else {
            categories.iter().map(String::as_str).collect()
        };

        let body = reqwest::Body::from(file.data.clone());
        let part = reqwest::multipart::Part::stream_with_length(body, file.size())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| Error::Validation(format!("Invalid MIME type '{}': {}", file.mime_type, e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("categories", serde_json::to_string(&categories)?);

        on_progress(mid);

        let response = self
            .send(self.request(Method::POST, "/upload").multipart(form), "Upload")
            .await?;

        on_progress(late);

        let receipt: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse upload response: {}", e)))?;

        on_progress(100);

        debug!(
            key = %receipt.key,
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload complete"
        );
        Ok(receipt.into())
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .request(Method::GET, "/health")
            .timeout(Duration::from_secs(defaults::HEALTH_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    info!("Upload API health check passed");
                    Ok(true)
                } else {
                    warn!("Upload API health check failed: {}", resp.status());
                    Ok(false)
                }
            }
            Err(e) => {
                warn!("Upload API health check error: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl OrderStore for HttpDirectoryClient {
    #[instrument(skip(self), fields(subsystem = "client", component = "http", op = "get_order"))]
    async fn get_persisted_order(&self) -> Result<Vec<String>> {
        self.ensure_configured()?;
        let body: OrderBody = self
            .send_json(self.request(Method::GET, "/gallery-order"), "Load order")
            .await?;
        Ok(body.order)
    }

    #[instrument(skip(self, order), fields(subsystem = "client", component = "http", op = "save_order", result_count = order.len()))]
    async fn save_persisted_order(&self, order: &[String]) -> Result<()> {
        self.ensure_configured()?;
        let body = OrderBody {
            order: order.to_vec(),
        };
        self.send(
            self.request(Method::PUT, "/gallery-order").json(&body),
            "Save order",
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for HttpDirectoryClient {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.ensure_configured()?;
        let body: CategoriesResponse = self
            .send_json(self.request(Method::GET, "/categories"), "List categories")
            .await?;
        Ok(body.categories)
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "http", op = "create_category"))]
    async fn create_category(&self, title: &str) -> Result<Category> {
        self.ensure_configured()?;
        let body: CategoryResponse = self
            .send_json(
                self.request(Method::POST, "/categories")
                    .json(&CreateCategoryRequest { title }),
                "Create category",
            )
            .await?;
        Ok(body.category)
    }

    #[instrument(skip(self), fields(subsystem = "client", component = "http", op = "delete_category"))]
    async fn delete_category(&self, id: &str) -> Result<()> {
        self.ensure_configured()?;
        let path = format!("/categories/{}", urlencoding::encode(id));
        self.send(self.request(Method::DELETE, &path), "Delete category")
            .await?;
        Ok(())
    }

    async fn reorder_categories(&self, ids: &[String]) -> Result<Vec<Category>> {
        self.ensure_configured()?;
        let body: CategoriesResponse = self
            .send_json(
                self.request(Method::PUT, "/categories/order")
                    .json(&OrderBody { order: ids.to_vec() }),
                "Reorder categories",
            )
            .await?;
        Ok(body.categories)
    }
}
