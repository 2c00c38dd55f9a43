//! Command implementations. Each returns the JSON document the binary prints.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::{json, Value};
use tracing::{info, warn};

use gallery_core::{format_size, DirectoryClient, Notice, RemoteFileRecord, SourceFile};
use gallery_state::{CategoryCatalog, GalleryOrderEngine, InMemoryPreviewStore, UploadTracker};

/// A directory plus the fixed entries configured for this run.
pub struct Session {
    directory: Arc<dyn DirectoryClient>,
    static_entries: Vec<RemoteFileRecord>,
}

impl Session {
    pub fn new(directory: Arc<dyn DirectoryClient>, static_entries: Vec<RemoteFileRecord>) -> Self {
        Self {
            directory,
            static_entries,
        }
    }

    fn engine(&self) -> GalleryOrderEngine {
        GalleryOrderEngine::new(self.directory.clone(), self.static_entries.clone())
    }

    async fn loaded_engine(&self) -> anyhow::Result<GalleryOrderEngine> {
        let engine = self.engine();
        engine.refresh().await.context("Failed to load gallery")?;
        Ok(engine)
    }

    async fn loaded_catalog(&self) -> anyhow::Result<CategoryCatalog> {
        let catalog = CategoryCatalog::new(self.directory.clone());
        catalog.refresh().await.context("Failed to load categories")?;
        Ok(catalog)
    }

    pub async fn health(&self) -> anyhow::Result<Value> {
        let healthy = self.directory.health_check().await?;
        Ok(json!({
            "healthy": healthy,
            "configured": self.directory.is_configured(),
        }))
    }

    /// The gallery in display order.
    pub async fn list(&self) -> anyhow::Result<Value> {
        let engine = self.loaded_engine().await?;
        Ok(gallery_json(&engine))
    }

    /// Upload image files tagged with `categories` (the default selection
    /// when empty). Non-image files are skipped.
    pub async fn upload(&self, paths: &[PathBuf], categories: &[String]) -> anyhow::Result<Value> {
        let (files, skipped) = read_images(paths).await?;
        if files.is_empty() {
            bail!("No image files to upload");
        }

        let catalog = self.loaded_catalog().await?;
        select_only(&catalog, categories)?;
        let selected = catalog.selected();

        let tracker = UploadTracker::new(
            self.directory.clone(),
            Arc::new(InMemoryPreviewStore::new()),
        );
        tracker.add_files(files, &selected);
        let report = tracker.upload_all_pending().await?;

        let engine = self.engine();
        if let Err(e) = engine.refresh().await {
            warn!(error = %e, "Gallery refresh after upload failed");
        }

        Ok(json!({
            "notice": Notice::for_batch(&report),
            "report": report,
            "categories": selected,
            "entries": tracker.snapshot(),
            "skipped": skipped,
            "galleryCount": engine.len(),
        }))
    }

    pub async fn delete(&self, key: &str) -> anyhow::Result<Value> {
        let engine = self.loaded_engine().await?;
        engine.delete(key).await?;
        info!(key, "Deleted");
        Ok(json!({
            "deleted": key,
            "notice": Notice::success("File deleted"),
            "dirty": engine.is_dirty(),
        }))
    }

    /// Move the item at 1-based `from` to 1-based `to` and save the order.
    pub async fn move_item(&self, from: usize, to: usize) -> anyhow::Result<Value> {
        let (from, to) = (zero_based(from)?, zero_based(to)?);
        let engine = self.loaded_engine().await?;
        engine.reorder(from, to)?;
        if engine.is_dirty() {
            engine.commit().await.context("Failed to save gallery order")?;
        }
        Ok(gallery_json(&engine))
    }

    pub async fn categories(&self) -> anyhow::Result<Value> {
        let catalog = self.loaded_catalog().await?;
        Ok(json!({ "categories": catalog.categories() }))
    }

    pub async fn add_category(&self, title: &str) -> anyhow::Result<Value> {
        let catalog = self.loaded_catalog().await?;
        let category = catalog.create(title).await?;
        Ok(json!({ "category": category }))
    }

    pub async fn remove_category(&self, id: &str) -> anyhow::Result<Value> {
        let catalog = self.loaded_catalog().await?;
        catalog.delete(id).await?;
        Ok(json!({ "deleted": id, "categories": catalog.categories() }))
    }

    pub async fn move_category(&self, from: usize, to: usize) -> anyhow::Result<Value> {
        let (from, to) = (zero_based(from)?, zero_based(to)?);
        let catalog = self.loaded_catalog().await?;
        catalog.move_category(from, to)?;
        catalog.save_order().await?;
        Ok(json!({ "categories": catalog.categories() }))
    }
}

fn zero_based(position: usize) -> anyhow::Result<usize> {
    match position.checked_sub(1) {
        Some(i) => Ok(i),
        None => bail!("Positions start at 1"),
    }
}

fn gallery_json(engine: &GalleryOrderEngine) -> Value {
    let items: Vec<Value> = engine
        .items()
        .iter()
        .enumerate()
        .map(|(i, r)| {
            json!({
                "position": i + 1,
                "key": r.key,
                "name": r.display_name(),
                "url": r.url,
                "thumbnailUrl": r.thumbnail_url,
                "size": r.size.map(format_size),
                "uploadedAt": r.uploaded_at,
                "categories": r.categories,
                "immutable": r.is_immutable,
            })
        })
        .collect();
    json!({
        "count": items.len(),
        "dirty": engine.is_dirty(),
        "items": items,
    })
}

/// Make the catalog selection exactly `titles` (no-op when empty).
fn select_only(catalog: &CategoryCatalog, titles: &[String]) -> anyhow::Result<()> {
    if titles.is_empty() {
        return Ok(());
    }
    let wanted: Vec<&str> = titles.iter().map(|t| t.trim()).collect();
    for title in catalog.selected() {
        if !wanted.contains(&title.as_str()) {
            catalog.toggle(&title)?;
        }
    }
    for title in wanted {
        if !catalog.selected().iter().any(|s| s == title) {
            catalog.toggle(title)?;
        }
    }
    Ok(())
}

/// Read `paths`, keeping image files. Returns the files and the names of
/// skipped non-images.
async fn read_images(paths: &[PathBuf]) -> anyhow::Result<(Vec<SourceFile>, Vec<String>)> {
    let mut files = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();
    for path in paths {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file = SourceFile::from_bytes(file_name(path), data);
        if file.is_image() {
            files.push(file);
        } else {
            warn!(name = %file.name, mime = %file.mime_type, "Skipping non-image file");
            skipped.push(file.name);
        }
    }
    Ok((files, skipped))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
