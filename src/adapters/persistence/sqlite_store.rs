//! SQLite-backed store via libsql. Implements RecordStore, RecordWriter and CategoryDirectory.
//!
//! Records persist the canonical keys of category, item and person next to the
//! display names, so filters are plain indexed equality instead of pattern matching.
//! Directory uniqueness is enforced by UNIQUE constraints on those keys.
//! All data shares one database file: data/expenses.db

use crate::domain::filter::order_records;
use crate::domain::{
    CanonicalKey, Category, DomainError, ExpenseRecord, Item, NewExpense, RecordQuery,
};
use crate::ports::{CategoryDirectory, RecordStore, RecordWriter};
use chrono::{DateTime, Utc};
use libsql::{Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL UNIQUE
)"#;

const ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories (id),
    name TEXT NOT NULL,
    name_key TEXT NOT NULL,
    UNIQUE (category_id, name_key)
)"#;

const EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    category_key TEXT NOT NULL,
    item TEXT NOT NULL,
    item_key TEXT NOT NULL,
    quantity REAL NOT NULL CHECK (quantity >= 0),
    price REAL NOT NULL CHECK (price >= 0),
    person TEXT NOT NULL,
    person_key TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    date_ms INTEGER NOT NULL
)"#;

const EXPENSES_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses (date_ms DESC)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_category_date ON expenses (category_key, date_ms DESC)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_person_date ON expenses (person_key, date_ms DESC)",
];

const SELECT_EXPENSES: &str = r#"
SELECT id, category, category_key, item, item_key, quantity, price,
       person, person_key, description, date_ms
FROM expenses
WHERE date_ms >= ?1 AND date_ms < ?2
  AND (?3 IS NULL OR category_key = ?3)
  AND (?4 IS NULL OR item_key = ?4)
  AND (?5 IS NULL OR person_key = ?5)
ORDER BY date_ms DESC, id DESC
"#;

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::StoreUnavailable(e.to_string())
}

/// Map a failed INSERT: unique violations become `DuplicateKey`, a dangling parent
/// reference is an `InvalidRecord`, anything else is a store failure.
fn insert_err(e: libsql::Error, entity: &'static str, key: &CanonicalKey) -> DomainError {
    let msg = e.to_string();
    if msg.contains("UNIQUE constraint failed") {
        DomainError::DuplicateKey {
            entity,
            key: key.to_string(),
        }
    } else if msg.contains("FOREIGN KEY constraint failed") {
        DomainError::InvalidRecord(format!("{} '{}' references a missing parent", entity, key))
    } else {
        store_err(e)
    }
}

/// SQLite store. One database file (expenses.db) in the given base directory.
pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned store is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("expenses.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = db.connect().map_err(store_err)?;

        // PRAGMA returns a row; drain it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::StoreUnavailable(format!("{} failed: {}", pragma, e)))?;
            while rows.next().await.map_err(store_err)?.is_some() {}
        }

        for ddl in [CATEGORIES_TABLE, ITEMS_TABLE, EXPENSES_TABLE] {
            conn.execute(ddl, ()).await.map_err(store_err)?;
        }
        for ddl in EXPENSES_INDEXES {
            conn.execute(ddl, ()).await.map_err(store_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<libsql::Connection, DomainError> {
        self.db.connect().map_err(store_err)
    }

    fn row_to_record(row: &Row) -> Result<ExpenseRecord, DomainError> {
        let date_ms: i64 = row.get(10).map_err(store_err)?;
        let date = DateTime::<Utc>::from_timestamp_millis(date_ms)
            .ok_or_else(|| store_err(format!("stored date {} out of range", date_ms)))?;
        let description: String = row.get(9).map_err(store_err)?;
        Ok(ExpenseRecord {
            id: row.get(0).map_err(store_err)?,
            category: row.get(1).map_err(store_err)?,
            category_key: CanonicalKey::new(&row.get::<String>(2).map_err(store_err)?),
            item: row.get(3).map_err(store_err)?,
            item_key: CanonicalKey::new(&row.get::<String>(4).map_err(store_err)?),
            quantity: row.get(5).map_err(store_err)?,
            price: row.get(6).map_err(store_err)?,
            person: row.get(7).map_err(store_err)?,
            person_key: CanonicalKey::new(&row.get::<String>(8).map_err(store_err)?),
            description: Some(description).filter(|d| !d.is_empty()),
            date,
        })
    }

    fn row_to_category(row: &Row) -> Result<Category, DomainError> {
        Ok(Category {
            id: row.get(0).map_err(store_err)?,
            name: row.get(1).map_err(store_err)?,
            key: CanonicalKey::new(&row.get::<String>(2).map_err(store_err)?),
        })
    }

    fn row_to_item(row: &Row) -> Result<Item, DomainError> {
        Ok(Item {
            id: row.get(0).map_err(store_err)?,
            category_id: row.get(1).map_err(store_err)?,
            name: row.get(2).map_err(store_err)?,
            key: CanonicalKey::new(&row.get::<String>(3).map_err(store_err)?),
        })
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    async fn find_records(&self, query: &RecordQuery) -> Result<Vec<ExpenseRecord>, DomainError> {
        let conn = self.conn()?;
        let category = query.category.as_ref().map(|k| k.as_str().to_string());
        let item = query.item.as_ref().map(|k| k.as_str().to_string());
        let person = query.person.as_ref().map(|k| k.as_str().to_string());
        let mut rows = conn
            .query(
                SELECT_EXPENSES,
                params![
                    query.interval.start().timestamp_millis(),
                    query.interval.end().timestamp_millis(),
                    category,
                    item,
                    person
                ],
            )
            .await
            .map_err(store_err)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            records.push(Self::row_to_record(&row)?);
        }
        order_records(&mut records);
        debug!(interval = %query.interval, matched = records.len(), "sqlite query");
        Ok(records)
    }
}

#[async_trait::async_trait]
impl RecordWriter for SqliteStore {
    async fn append_records(
        &self,
        expenses: &[NewExpense],
    ) -> Result<Vec<ExpenseRecord>, DomainError> {
        for e in expenses {
            e.validate()?;
        }
        if expenses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let tx = conn.transaction().await.map_err(store_err)?;
        let mut saved = Vec::with_capacity(expenses.len());
        for e in expenses {
            let draft = ExpenseRecord::from_new(0, e.clone());
            tx.execute(
                r#"
                INSERT INTO expenses (category, category_key, item, item_key, quantity, price,
                                      person, person_key, description, date_ms)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    draft.category.as_str(),
                    draft.category_key.as_str(),
                    draft.item.as_str(),
                    draft.item_key.as_str(),
                    draft.quantity,
                    draft.price,
                    draft.person.as_str(),
                    draft.person_key.as_str(),
                    draft.description.clone().unwrap_or_default(),
                    draft.date.timestamp_millis()
                ],
            )
            .await
            .map_err(store_err)?;
            saved.push(ExpenseRecord {
                id: tx.last_insert_rowid(),
                ..draft
            });
        }
        tx.commit().await.map_err(store_err)?;
        info!(
            path = %self.db_path.display(),
            count = saved.len(),
            "appended expenses"
        );
        Ok(saved)
    }
}

#[async_trait::async_trait]
impl CategoryDirectory for SqliteStore {
    async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, name_key FROM categories ORDER BY name_key",
                (),
            )
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(Self::row_to_category(&row)?);
        }
        Ok(out)
    }

    async fn find_category(&self, key: &CanonicalKey) -> Result<Option<Category>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, name_key FROM categories WHERE name_key = ?1",
                params![key.as_str()],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_category(&self, name: &str) -> Result<Category, DomainError> {
        let key = CanonicalKey::new(name);
        if key.is_empty() {
            return Err(DomainError::InvalidRecord("category name is empty".into()));
        }
        let conn = self.conn()?;
        let name = name.trim();
        conn.execute(
            "INSERT INTO categories (name, name_key) VALUES (?1, ?2)",
            params![name, key.as_str()],
        )
        .await
        .map_err(|e| insert_err(e, "category", &key))?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            key,
        })
    }

    async fn list_items(&self, category_id: i64) -> Result<Vec<Item>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, category_id, name, name_key FROM items WHERE category_id = ?1 ORDER BY name_key",
                params![category_id],
            )
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(Self::row_to_item(&row)?);
        }
        Ok(out)
    }

    async fn find_item(
        &self,
        category_id: i64,
        key: &CanonicalKey,
    ) -> Result<Option<Item>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, category_id, name, name_key FROM items WHERE category_id = ?1 AND name_key = ?2",
                params![category_id, key.as_str()],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_item(&self, category_id: i64, name: &str) -> Result<Item, DomainError> {
        let key = CanonicalKey::new(name);
        if key.is_empty() {
            return Err(DomainError::InvalidRecord("item name is empty".into()));
        }
        let conn = self.conn()?;
        let name = name.trim();
        let inserted = conn
            .execute(
                r#"
                INSERT INTO items (category_id, name, name_key)
                SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM categories WHERE id = ?1)
                "#,
                params![category_id, name, key.as_str()],
            )
            .await
            .map_err(|e| insert_err(e, "item", &key))?;
        if inserted == 0 {
            return Err(DomainError::InvalidRecord(format!(
                "no category with id {}",
                category_id
            )));
        }
        Ok(Item {
            id: conn.last_insert_rowid(),
            category_id,
            name: name.to_string(),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PeriodResolver, PeriodSelector};
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let n = DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "expense-insights-test-{}-{}",
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn expense(category: &str, item: &str, price: f64, day: u32) -> NewExpense {
        NewExpense {
            category: category.into(),
            item: item.into(),
            quantity: 1.0,
            price,
            person: "Kiran".into(),
            description: Some("weekly shop".into()),
            date: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        }
    }

    fn january() -> RecordQuery {
        RecordQuery::new(
            PeriodResolver::utc()
                .resolve(&PeriodSelector::Month {
                    anchor: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                })
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_roundtrip_and_ordering() {
        let dir = scratch_dir();
        let store = SqliteStore::connect(&dir).await.unwrap();
        let saved = store
            .append_records(&[
                expense("stationery", "Pens", 20.0, 3),
                expense("Food", "Rice", 50.0, 9),
                expense("Stationery", "Ink", 15.0, 3),
            ])
            .await
            .unwrap();
        assert_eq!(saved.len(), 3);
        assert!(saved[0].id < saved[2].id);

        let all = store.find_records(&january()).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![saved[1].id, saved[2].id, saved[0].id]);
        assert_eq!(all[0].description.as_deref(), Some("weekly shop"));

        let query = RecordQuery {
            category: Some(CanonicalKey::new("STATIONERY")),
            ..january()
        };
        let stationery = store.find_records(&query).await.unwrap();
        assert_eq!(stationery.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unique_keys_map_to_duplicate_key() {
        let dir = scratch_dir();
        let store = SqliteStore::connect(&dir).await.unwrap();
        let food = store.create_category("Food").await.unwrap();
        let err = store.create_category("food").await.unwrap_err();
        assert!(err.is_duplicate_key());

        store.create_item(food.id, "Rice").await.unwrap();
        assert!(store.create_item(food.id, " rice ").await.unwrap_err().is_duplicate_key());

        let found = store
            .find_category(&CanonicalKey::new("FOOD"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, food.id);
        assert_eq!(store.list_items(food.id).await.unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_item_for_unknown_category_matches_memory_store() {
        let dir = scratch_dir();
        let store = SqliteStore::connect(&dir).await.unwrap();
        let memory = crate::adapters::persistence::MemoryStore::new();

        let sqlite_err = store.create_item(9999, "Rice").await.unwrap_err();
        let memory_err = memory.create_item(9999, "Rice").await.unwrap_err();
        assert_eq!(
            sqlite_err,
            DomainError::InvalidRecord("no category with id 9999".into())
        );
        assert_eq!(sqlite_err, memory_err);
        assert!(store.list_items(9999).await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_blank_description_reads_back_as_none() {
        let dir = scratch_dir();
        let store = SqliteStore::connect(&dir).await.unwrap();
        let mut plain = expense("Food", "Rice", 10.0, 4);
        plain.description = None;
        store.append_records(&[plain]).await.unwrap();

        let found = store.find_records(&january()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
