//! Ingestion use case: make sure every category/item exists in the directory,
//! then append the records in one batch.

use crate::domain::{DomainError, NewExpense};
use crate::ports::RecordWriter;
use crate::usecases::directory_service::DirectoryService;
use std::sync::Arc;
use tracing::info;

/// Result of one import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub records: usize,
    pub categories_created: usize,
    pub items_created: usize,
}

pub struct ImportService {
    directory: Arc<DirectoryService>,
    writer: Arc<dyn RecordWriter>,
}

impl ImportService {
    pub fn new(directory: Arc<DirectoryService>, writer: Arc<dyn RecordWriter>) -> Self {
        Self { directory, writer }
    }

    pub async fn import(&self, expenses: &[NewExpense]) -> Result<ImportStats, DomainError> {
        for e in expenses {
            e.validate()?;
        }
        let mut stats = ImportStats::default();
        for e in expenses {
            let (category, created) = self.directory.ensure_category(&e.category).await?;
            stats.categories_created += usize::from(created);
            let (_, created) = self.directory.ensure_item(category.id, &e.item).await?;
            stats.items_created += usize::from(created);
        }
        stats.records = self.writer.append_records(expenses).await?.len();
        info!(
            records = stats.records,
            categories_created = stats.categories_created,
            items_created = stats.items_created,
            "import complete"
        );
        Ok(stats)
    }
}
