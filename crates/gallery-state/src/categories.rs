//! Category catalog and the upload category selection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument};

use gallery_core::{defaults, find_by_title, is_tagged_with, Category, DirectoryClient, Error, Result};

struct CatalogState {
    categories: Vec<Category>,
    /// Selected titles, in selection order.
    selected: Vec<String>,
}

/// Shared handle to the category list and the current selection.
#[derive(Clone)]
pub struct CategoryCatalog {
    directory: Arc<dyn DirectoryClient>,
    state: Arc<Mutex<CatalogState>>,
}

impl CategoryCatalog {
    /// Empty catalog with the default category selected.
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self {
            directory,
            state: Arc::new(Mutex::new(CatalogState {
                categories: Vec::new(),
                selected: vec![defaults::DEFAULT_CATEGORY.to_string()],
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reload the catalog. Selected titles that no longer exist are dropped.
    #[instrument(skip(self), fields(subsystem = "state", component = "categories", op = "refresh"))]
    pub async fn refresh(&self) -> Result<()> {
        let categories = self.directory.list_categories().await?;

        let mut state = self.lock();
        let CatalogState {
            categories: current,
            selected,
        } = &mut *state;
        *current = categories;
        selected.retain(|title| find_by_title(current, title).is_some());
        debug!(result_count = current.len(), "Loaded categories");
        Ok(())
    }

    /// Create a category. The title is trimmed and must be non-empty and
    /// not already in the catalog.
    #[instrument(skip(self), fields(subsystem = "state", component = "categories", op = "create"))]
    pub async fn create(&self, title: &str) -> Result<Category> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Category title cannot be empty".to_string()));
        }
        let exists = find_by_title(&self.lock().categories, title).is_some();
        if exists {
            return Err(Error::Duplicate(format!("Category '{}' already exists", title)));
        }

        let category = self.directory.create_category(title).await?;

        let mut state = self.lock();
        if !state.categories.iter().any(|c| c.id == category.id) {
            state.categories.push(category.clone());
        }
        info!(category = %category.title, "Created category");
        Ok(category)
    }

    /// Delete a category by id. Default categories are refused.
    #[instrument(skip(self), fields(subsystem = "state", component = "categories", op = "delete"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        {
            let state = self.lock();
            match state.categories.iter().find(|c| c.id == id) {
                None => return Err(Error::Validation(format!("Unknown category: {}", id))),
                Some(c) if c.is_default => {
                    return Err(Error::Forbidden(format!(
                        "Default category '{}' cannot be deleted",
                        c.title
                    )))
                }
                Some(_) => {}
            }
        }

        self.directory.delete_category(id).await?;

        let mut state = self.lock();
        if let Some(i) = state.categories.iter().position(|c| c.id == id) {
            let removed = state.categories.remove(i);
            state.selected.retain(|t| t != &removed.title);
            info!(category = %removed.title, "Deleted category");
        }
        Ok(())
    }

    /// Flip the selection of `title`. Returns whether it is now selected.
    pub fn toggle(&self, title: &str) -> Result<bool> {
        let mut state = self.lock();
        let title = match find_by_title(&state.categories, title) {
            Some(c) => c.title.clone(),
            None => return Err(Error::Validation(format!("Unknown category: {}", title))),
        };
        if let Some(i) = state.selected.iter().position(|t| *t == title) {
            state.selected.remove(i);
            Ok(false)
        } else {
            state.selected.push(title);
            Ok(true)
        }
    }

    /// Selected titles in catalog order. Before the first refresh this is
    /// the initial selection.
    pub fn selected(&self) -> Vec<String> {
        let state = self.lock();
        if state.categories.is_empty() {
            return state.selected.clone();
        }
        state
            .categories
            .iter()
            .filter(|c| is_tagged_with(&state.selected, c))
            .map(|c| c.title.clone())
            .collect()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    /// Move a category within the local list. Call [`Self::save_order`] to
    /// persist it.
    pub fn move_category(&self, from: usize, to: usize) -> Result<()> {
        let mut state = self.lock();
        let len = state.categories.len();
        if from >= len || to >= len {
            return Err(Error::Validation(format!(
                "Category index out of range: {} -> {} (len {})",
                from, to, len
            )));
        }
        let c = state.categories.remove(from);
        state.categories.insert(to, c);
        Ok(())
    }

    /// Persist the local category order and adopt what the backend returns.
    #[instrument(skip(self), fields(subsystem = "state", component = "categories", op = "save_order"))]
    pub async fn save_order(&self) -> Result<()> {
        let ids: Vec<String> = self.lock().categories.iter().map(|c| c.id.clone()).collect();
        let stored = self.directory.reorder_categories(&ids).await?;
        self.lock().categories = stored;
        Ok(())
    }
}
