//! Category/Item directory use case. Lookup plus create-or-resolve.
//!
//! Two concurrent "add custom value" flows may race to create the same canonical
//! name. The store's uniqueness check decides; the loser gets `DuplicateKey` and
//! re-resolves to the winner's entity.

use crate::domain::{CanonicalKey, Category, DomainError, Item};
use crate::ports::CategoryDirectory;
use std::sync::Arc;
use tracing::info;

pub struct DirectoryService {
    directory: Arc<dyn CategoryDirectory>,
}

impl DirectoryService {
    pub fn new(directory: Arc<dyn CategoryDirectory>) -> Self {
        Self { directory }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, DomainError> {
        self.directory.list_categories().await
    }

    pub async fn items(&self, category_id: i64) -> Result<Vec<Item>, DomainError> {
        self.directory.list_items(category_id).await
    }

    /// Items of the category named `name`, or empty if no such category exists.
    pub async fn items_for_category(&self, name: &str) -> Result<Vec<Item>, DomainError> {
        match self.directory.find_category(&CanonicalKey::new(name)).await? {
            Some(c) => self.directory.list_items(c.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Existing category with this canonical name, or a new one. The flag is true when created.
    pub async fn ensure_category(&self, name: &str) -> Result<(Category, bool), DomainError> {
        let key = CanonicalKey::new(name);
        if let Some(existing) = self.directory.find_category(&key).await? {
            return Ok((existing, false));
        }
        match self.directory.create_category(name).await {
            Ok(created) => Ok((created, true)),
            Err(e) if e.is_duplicate_key() => {
                info!(key = %key, "category created concurrently; resolving existing");
                let existing = self.directory.find_category(&key).await?.ok_or_else(|| {
                    DomainError::StoreUnavailable(format!(
                        "category '{}' reported duplicate but not found",
                        key
                    ))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Existing item with this canonical name in the category, or a new one.
    pub async fn ensure_item(&self, category_id: i64, name: &str) -> Result<(Item, bool), DomainError> {
        let key = CanonicalKey::new(name);
        if let Some(existing) = self.directory.find_item(category_id, &key).await? {
            return Ok((existing, false));
        }
        match self.directory.create_item(category_id, name).await {
            Ok(created) => Ok((created, true)),
            Err(e) if e.is_duplicate_key() => {
                info!(category_id, key = %key, "item created concurrently; resolving existing");
                let existing = self
                    .directory
                    .find_item(category_id, &key)
                    .await?
                    .ok_or_else(|| {
                        DomainError::StoreUnavailable(format!(
                            "item '{}' reported duplicate but not found",
                            key
                        ))
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }
}
