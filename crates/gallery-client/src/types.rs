//! Wire types for the upload API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use gallery_core::{Category, RemoteFileRecord, UploadReceipt};

/// Treat an explicit `null` list the same as a missing one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of `GET /files`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileDto {
    pub key: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploaded: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub original_name: Option<String>,
}

impl From<FileDto> for RemoteFileRecord {
    fn from(dto: FileDto) -> Self {
        let uploaded_at = dto
            .uploaded
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let thumbnail_url = dto
            .thumbnail_url
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| dto.url.clone());

        RemoteFileRecord {
            key: dto.key,
            url: dto.url,
            thumbnail_url,
            size: dto.size,
            uploaded_at,
            categories: dto.categories,
            original_name: dto.original_name,
            is_immutable: false,
        }
    }
}

/// Response of `GET /files`.
#[derive(Debug, Deserialize)]
pub(crate) struct FilesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileDto>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// Response of `POST /upload`. The Express proxy names the URL `publicUrl`.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub key: String,
    #[serde(alias = "publicUrl")]
    pub url: String,
}

impl From<UploadResponse> for UploadReceipt {
    fn from(r: UploadResponse) -> Self {
        UploadReceipt {
            key: r.key,
            url: r.url,
        }
    }
}

/// `{error}` body of a failed call.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// `{order}` body of the gallery-order and category-order endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OrderBody {
    #[serde(default)]
    pub order: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryResponse {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCategoryRequest<'a> {
    pub title: &'a str,
}
