//! CSV reader for expense rows. Uses the `csv` crate with serde.
//!
//! Header: `category,item,quantity,price,person,description,date`.
//! `date` is either RFC 3339 or a plain `YYYY-MM-DD`, the latter taken as local
//! midnight in the deployment offset.

use crate::domain::{DomainError, NewExpense, PeriodResolver, PeriodSelector};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    category: String,
    item: String,
    quantity: f64,
    price: f64,
    person: String,
    #[serde(default)]
    description: Option<String>,
    date: String,
}

fn parse_date(raw: &str, resolver: &PeriodResolver) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DomainError::InvalidRecord(format!("bad date '{}': {}", raw, e)))?;
    Ok(resolver
        .resolve(&PeriodSelector::Day { anchor: day })?
        .start())
}

/// Parse every row. The first bad row fails the whole read with its line number.
pub fn read_expenses<R: Read>(
    reader: R,
    resolver: &PeriodResolver,
) -> Result<Vec<NewExpense>, DomainError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let row = row.map_err(|e| DomainError::InvalidRecord(format!("line {}: {}", line, e)))?;
        let expense = NewExpense {
            date: parse_date(&row.date, resolver)
                .map_err(|e| DomainError::InvalidRecord(format!("line {}: {}", line, e)))?,
            category: row.category,
            item: row.item,
            quantity: row.quantity,
            price: row.price,
            person: row.person,
            description: row.description.filter(|d| !d.is_empty()),
        };
        expense
            .validate()
            .map_err(|e| DomainError::InvalidRecord(format!("line {}: {}", line, e)))?;
        out.push(expense);
    }
    Ok(out)
}

pub fn read_expenses_file(
    path: impl AsRef<Path>,
    resolver: &PeriodResolver,
) -> Result<Vec<NewExpense>, DomainError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| DomainError::StoreUnavailable(format!("open {}: {}", path.display(), e)))?;
    read_expenses(file, resolver)
}
