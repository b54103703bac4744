//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    CanonicalKey, Category, DomainError, ExpenseRecord, Item, NewExpense, RecordQuery,
};
use chrono::{DateTime, Utc};

/// Queryable record store. Read-only from the core's point of view.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Records inside `query.interval` whose canonical keys equal every given
    /// predicate. Sorted by date descending, ties by id descending.
    async fn find_records(&self, query: &RecordQuery) -> Result<Vec<ExpenseRecord>, DomainError>;
}

/// Append side of the store. Used by ingestion, never by the reporting core.
#[async_trait::async_trait]
pub trait RecordWriter: Send + Sync {
    /// Append validated expenses. Returns them with their assigned ids, in input order.
    async fn append_records(
        &self,
        expenses: &[NewExpense],
    ) -> Result<Vec<ExpenseRecord>, DomainError>;
}

/// Category/Item directory. Name-keyed, unique under canonical-key comparison.
#[async_trait::async_trait]
pub trait CategoryDirectory: Send + Sync {
    /// All categories ordered by canonical key.
    async fn list_categories(&self) -> Result<Vec<Category>, DomainError>;

    async fn find_category(&self, key: &CanonicalKey) -> Result<Option<Category>, DomainError>;

    /// Fails with `DuplicateKey` if a category with the same canonical key exists.
    async fn create_category(&self, name: &str) -> Result<Category, DomainError>;

    /// Items of one category ordered by canonical key.
    async fn list_items(&self, category_id: i64) -> Result<Vec<Item>, DomainError>;

    async fn find_item(
        &self,
        category_id: i64,
        key: &CanonicalKey,
    ) -> Result<Option<Item>, DomainError>;

    /// Fails with `DuplicateKey` if the category already has an item with the same key.
    async fn create_item(&self, category_id: i64, name: &str) -> Result<Item, DomainError>;
}

/// Source of "now". Relative periods and the current-month policy read it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
