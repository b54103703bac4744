//! Domain entities. Pure data structures for the core business.
//!
//! Records carry the canonical keys of their categorical fields so that stores
//! can match on key equality instead of pattern matching at query time.

use super::errors::DomainError;
use super::names::CanonicalKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single stored expense line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Creation order. Larger ids were created later.
    pub id: i64,
    pub category: String,
    pub category_key: CanonicalKey,
    pub item: String,
    pub item_key: CanonicalKey,
    pub quantity: f64,
    /// Line total, not a unit price.
    pub price: f64,
    pub person: String,
    pub person_key: CanonicalKey,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Materialize a validated `NewExpense` under the id assigned by the store.
    pub fn from_new(id: i64, new: NewExpense) -> Self {
        Self {
            id,
            category_key: CanonicalKey::new(&new.category),
            item_key: CanonicalKey::new(&new.item),
            person_key: CanonicalKey::new(&new.person),
            category: new.category.trim().to_string(),
            item: new.item.trim().to_string(),
            quantity: new.quantity,
            price: new.price,
            person: new.person.trim().to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
            date: new.date,
        }
    }

    /// `quantity × price`. Only used when the configured cost basis asks for it.
    pub fn extended_amount(&self) -> f64 {
        self.quantity * self.price
    }
}

/// Input for appending a record. Validated before it reaches a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub category: String,
    pub item: String,
    pub quantity: f64,
    pub price: f64,
    pub person: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("category", &self.category),
            ("item", &self.item),
            ("person", &self.person),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidRecord(format!("{} is empty", field)));
            }
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(DomainError::InvalidRecord(format!(
                "quantity must be non-negative, got {}",
                self.quantity
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::InvalidRecord(format!(
                "price must be non-negative, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Category entity. Name is globally unique by canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub key: CanonicalKey,
}

/// Item entity. Name is unique by canonical key within its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub key: CanonicalKey,
}
