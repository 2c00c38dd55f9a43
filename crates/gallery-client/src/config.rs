//! Directory client configuration.

use gallery_core::defaults;

/// Configuration for [`crate::HttpDirectoryClient`].
///
/// Built once at startup and passed to the client; the client itself never
/// reads the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the upload API (no trailing slash required).
    pub base_url: String,
    /// Shared secret sent with every request (required for uploads and
    /// other mutating calls).
    pub api_key: Option<String>,
    /// Header name carrying `api_key`.
    pub auth_header: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_URL.to_string(),
            api_key: None,
            auth_header: defaults::AUTH_HEADER.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GALLERY_API_URL` | `http://localhost:8787` | Upload API base URL |
    /// | `GALLERY_API_KEY` | (none) | Shared upload secret |
    /// | `GALLERY_AUTH_HEADER` | `X-Upload-Key` | Header carrying the secret |
    /// | `GALLERY_TIMEOUT_SECS` | `60` | Request timeout |
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_API_URL)
            .unwrap_or_else(|_| defaults::API_URL.to_string());
        let api_key = std::env::var(defaults::ENV_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let auth_header = std::env::var(defaults::ENV_AUTH_HEADER)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| defaults::AUTH_HEADER.to_string());
        let timeout_seconds = std::env::var(defaults::ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REQUEST_TIMEOUT_SECS)
            .max(1);

        Self {
            base_url,
            api_key,
            auth_header,
            timeout_seconds,
        }
    }

    /// Both an endpoint and a key are present.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && self.api_key.is_some()
    }

    /// Join `path` onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
