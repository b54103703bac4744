//! Grouped sums over a filtered record set.
//!
//! Entries come out in first-seen order of a chronological scan (date ascending,
//! then creation id ascending). Callers and tests may rely on that order.

use super::entities::ExpenseRecord;
use super::filter::FilterRequest;
use super::names::{CanonicalKey, display_label};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which amount counts as the cost of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// `price` is already the line total.
    #[default]
    Price,
    QuantityTimesPrice,
}

impl CostBasis {
    pub fn amount(self, record: &ExpenseRecord) -> f64 {
        match self {
            CostBasis::Price => record.price,
            CostBasis::QuantityTimesPrice => record.extended_amount(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupKind {
    Category,
    Item,
    Person,
}

impl RollupKind {
    /// Pick the grouping from the unconstrained dimensions: no category pinned
    /// groups by category; category without item groups by item; both pinned
    /// groups by person.
    pub fn for_request(request: &FilterRequest) -> Self {
        if request.category.is_all() {
            RollupKind::Category
        } else if request.item.is_all() {
            RollupKind::Item
        } else {
            RollupKind::Person
        }
    }

    fn pick<'a>(self, record: &'a ExpenseRecord) -> (&'a CanonicalKey, &'a str) {
        match self {
            RollupKind::Category => (&record.category_key, &record.category),
            RollupKind::Item => (&record.item_key, &record.item),
            RollupKind::Person => (&record.person_key, &record.person),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupEntry {
    pub key: CanonicalKey,
    /// Capitalized display form of the first name seen for this key.
    pub label: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub kind: RollupKind,
    pub entries: Vec<RollupEntry>,
    pub total_of_all: f64,
    pub count: usize,
}

impl Rollup {
    pub fn empty(kind: RollupKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            total_of_all: 0.0,
            count: 0,
        }
    }

    /// Group `records` by the canonical key of `kind` and sum their cost.
    pub fn compute(kind: RollupKind, records: &[ExpenseRecord], basis: CostBasis) -> Self {
        let mut chronological: Vec<&ExpenseRecord> = records.iter().collect();
        chronological.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let mut index: HashMap<&CanonicalKey, usize> = HashMap::new();
        let mut entries: Vec<RollupEntry> = Vec::new();
        let mut total_of_all = 0.0;

        for record in chronological {
            let amount = basis.amount(record);
            total_of_all += amount;
            let (key, name) = kind.pick(record);
            match index.get(key) {
                Some(&i) => {
                    entries[i].total += amount;
                    entries[i].count += 1;
                }
                None => {
                    index.insert(key, entries.len());
                    entries.push(RollupEntry {
                        key: key.clone(),
                        label: display_label(name),
                        total: amount,
                        count: 1,
                    });
                }
            }
        }

        Self {
            kind,
            entries,
            total_of_all,
            count: records.len(),
        }
    }

    /// Fraction of `total_of_all` held by `entry`. Zero when nothing was spent.
    pub fn share(&self, entry: &RollupEntry) -> f64 {
        if self.total_of_all == 0.0 {
            0.0
        } else {
            entry.total / self.total_of_all
        }
    }

    pub fn shares(&self) -> Vec<(&RollupEntry, f64)> {
        self.entries.iter().map(|e| (e, self.share(e))).collect()
    }

    /// Entries by total, largest first. Ties keep first-seen order.
    pub fn ranked(&self) -> Vec<&RollupEntry> {
        let mut ranked: Vec<&RollupEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sum of cost over `records`.
pub fn total_of(records: &[ExpenseRecord], basis: CostBasis) -> f64 {
    records.iter().map(|r| basis.amount(r)).sum()
}
