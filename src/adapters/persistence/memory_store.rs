//! In-process store. Implements RecordStore, RecordWriter and CategoryDirectory
//! behind one tokio RwLock.
//!
//! Used for tests and for running reports over an imported CSV without a database.

use crate::domain::filter::order_records;
use crate::domain::{
    CanonicalKey, Category, DomainError, ExpenseRecord, Item, NewExpense, RecordQuery,
};
use crate::ports::{CategoryDirectory, RecordStore, RecordWriter};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryData {
    records: Vec<ExpenseRecord>,
    categories: Vec<Category>,
    items: Vec<Item>,
    last_record_id: i64,
    last_category_id: i64,
    last_item_id: i64,
}

/// Memory-backed store. Ids are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_count(&self) -> usize {
        self.data.read().await.records.len()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn find_records(&self, query: &RecordQuery) -> Result<Vec<ExpenseRecord>, DomainError> {
        let data = self.data.read().await;
        let mut out: Vec<ExpenseRecord> = data
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        order_records(&mut out);
        debug!(interval = %query.interval, matched = out.len(), "memory store query");
        Ok(out)
    }
}

#[async_trait::async_trait]
impl RecordWriter for MemoryStore {
    async fn append_records(
        &self,
        expenses: &[NewExpense],
    ) -> Result<Vec<ExpenseRecord>, DomainError> {
        for e in expenses {
            e.validate()?;
        }
        let mut data = self.data.write().await;
        let mut saved = Vec::with_capacity(expenses.len());
        for e in expenses {
            data.last_record_id += 1;
            let record = ExpenseRecord::from_new(data.last_record_id, e.clone());
            data.records.push(record.clone());
            saved.push(record);
        }
        Ok(saved)
    }
}

#[async_trait::async_trait]
impl CategoryDirectory for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut out = self.data.read().await.categories.clone();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    async fn find_category(&self, key: &CanonicalKey) -> Result<Option<Category>, DomainError> {
        let data = self.data.read().await;
        Ok(data.categories.iter().find(|c| &c.key == key).cloned())
    }

    async fn create_category(&self, name: &str) -> Result<Category, DomainError> {
        let key = CanonicalKey::new(name);
        if key.is_empty() {
            return Err(DomainError::InvalidRecord("category name is empty".into()));
        }
        // Check and insert under one write guard so concurrent creators serialize.
        let mut data = self.data.write().await;
        if data.categories.iter().any(|c| c.key == key) {
            return Err(DomainError::DuplicateKey {
                entity: "category",
                key: key.to_string(),
            });
        }
        data.last_category_id += 1;
        let category = Category {
            id: data.last_category_id,
            name: name.trim().to_string(),
            key,
        };
        data.categories.push(category.clone());
        Ok(category)
    }

    async fn list_items(&self, category_id: i64) -> Result<Vec<Item>, DomainError> {
        let data = self.data.read().await;
        let mut out: Vec<Item> = data
            .items
            .iter()
            .filter(|i| i.category_id == category_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    async fn find_item(
        &self,
        category_id: i64,
        key: &CanonicalKey,
    ) -> Result<Option<Item>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .items
            .iter()
            .find(|i| i.category_id == category_id && &i.key == key)
            .cloned())
    }

    async fn create_item(&self, category_id: i64, name: &str) -> Result<Item, DomainError> {
        let key = CanonicalKey::new(name);
        if key.is_empty() {
            return Err(DomainError::InvalidRecord("item name is empty".into()));
        }
        let mut data = self.data.write().await;
        if !data.categories.iter().any(|c| c.id == category_id) {
            return Err(DomainError::InvalidRecord(format!(
                "no category with id {}",
                category_id
            )));
        }
        if data
            .items
            .iter()
            .any(|i| i.category_id == category_id && i.key == key)
        {
            return Err(DomainError::DuplicateKey {
                entity: "item",
                key: key.to_string(),
            });
        }
        data.last_item_id += 1;
        let item = Item {
            id: data.last_item_id,
            category_id,
            name: name.trim().to_string(),
            key,
        };
        data.items.push(item.clone());
        Ok(item)
    }
}
