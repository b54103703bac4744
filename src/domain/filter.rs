//! Record filtering: the immutable request value, categorical selections and
//! the matching/ordering rules every store must honour.

use super::entities::ExpenseRecord;
use super::errors::DomainError;
use super::names::CanonicalKey;
use super::period::{Interval, PeriodResolver, PeriodSelector};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sentinel for "no constraint" on the category dimension.
pub const ALL_CATEGORIES: &str = "All Categories";
/// Sentinel for "no constraint" on the item dimension.
pub const ALL_ITEMS: &str = "All Items";
/// Sentinel for "no constraint" on the person dimension.
pub const ALL_PEOPLE: &str = "All People";

/// Constraint on one categorical dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "key")]
pub enum Selection {
    #[default]
    All,
    Only(CanonicalKey),
}

impl Selection {
    /// Parse a raw wire value. Missing, blank, or the sentinel (any case) mean `All`;
    /// the sentinel is never matched literally against stored names.
    pub fn parse(raw: Option<&str>, sentinel: &str) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Selection::All,
            Some(s) if s.eq_ignore_ascii_case(sentinel) => Selection::All,
            Some(s) => Selection::Only(CanonicalKey::new(s)),
        }
    }

    pub fn only(name: &str) -> Self {
        Selection::Only(CanonicalKey::new(name))
    }

    pub fn key(&self) -> Option<&CanonicalKey> {
        match self {
            Selection::All => None,
            Selection::Only(k) => Some(k),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Exact canonical-key equality. Never substring or prefix.
    pub fn matches(&self, key: &CanonicalKey) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(k) => k == key,
        }
    }
}

/// Store-facing query: resolved interval plus optional key equality predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub interval: Interval,
    pub category: Option<CanonicalKey>,
    pub item: Option<CanonicalKey>,
    pub person: Option<CanonicalKey>,
}

impl RecordQuery {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            category: None,
            item: None,
            person: None,
        }
    }

    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        self.interval.contains(record.date)
            && self.category.as_ref().is_none_or(|k| *k == record.category_key)
            && self.item.as_ref().is_none_or(|k| *k == record.item_key)
            && self.person.as_ref().is_none_or(|k| *k == record.person_key)
    }
}

/// One filter request, passed by value into the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub period: PeriodSelector,
    #[serde(default)]
    pub category: Selection,
    #[serde(default)]
    pub item: Selection,
    #[serde(default)]
    pub person: Selection,
}

impl FilterRequest {
    pub fn new(period: PeriodSelector) -> Self {
        Self {
            period,
            category: Selection::All,
            item: Selection::All,
            person: Selection::All,
        }
    }

    pub fn with_category(mut self, name: &str) -> Self {
        self.category = Selection::only(name);
        self
    }

    pub fn with_item(mut self, name: &str) -> Self {
        self.item = Selection::only(name);
        self
    }

    pub fn with_person(mut self, name: &str) -> Self {
        self.person = Selection::only(name);
        self
    }

    /// Validate and resolve into a store query. Fails before any store access.
    pub fn to_query(&self, resolver: &PeriodResolver) -> Result<RecordQuery, DomainError> {
        let interval = resolver.resolve(&self.period)?;
        Ok(RecordQuery {
            interval,
            category: self.category.key().cloned(),
            item: self.item.key().cloned(),
            person: self.person.key().cloned(),
        })
    }
}

/// Wire form of a filter request. Dates are plain `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    #[serde(default)]
    pub period: Option<String>,
    /// Anchor for day/week/month/year. `date` is accepted as an alias.
    #[serde(default, alias = "date")]
    pub anchor: Option<NaiveDate>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
}

impl FilterQuery {
    pub fn into_request(self, today: NaiveDate) -> Result<FilterRequest, DomainError> {
        let period = PeriodSelector::from_parts(
            self.period.as_deref(),
            self.anchor,
            self.start_date,
            self.end_date,
            today,
        )?;
        Ok(FilterRequest {
            period,
            category: Selection::parse(self.category.as_deref(), ALL_CATEGORIES),
            item: Selection::parse(self.item.as_deref(), ALL_ITEMS),
            person: Selection::parse(self.person.as_deref(), ALL_PEOPLE),
        })
    }
}

/// Output order: date descending, then creation id descending.
pub fn newest_first(a: &ExpenseRecord, b: &ExpenseRecord) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
}

/// Stable in-place sort into output order.
pub fn order_records(records: &mut [ExpenseRecord]) {
    records.sort_by(newest_first);
}
