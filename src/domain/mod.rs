//! Core domain layer. No external I/O dependencies.
//!
//! Period resolution, filtering, rollups and comparison series live here.
//! Dependencies flow inward.

pub mod comparison;
pub mod entities;
pub mod errors;
pub mod filter;
pub mod names;
pub mod period;
pub mod rollup;

pub use comparison::{
    ComparisonMode, ComparisonRequest, ComparisonSeries, MonthlySeriesPolicy, SeriesPlan,
    SeriesPoint,
};
pub use entities::{Category, ExpenseRecord, Item, NewExpense};
pub use errors::DomainError;
pub use filter::{
    ALL_CATEGORIES, ALL_ITEMS, ALL_PEOPLE, FilterQuery, FilterRequest, RecordQuery, Selection,
};
pub use names::{CanonicalKey, display_label};
pub use period::{Interval, PeriodKind, PeriodResolver, PeriodSelector};
pub use rollup::{CostBasis, Rollup, RollupEntry, RollupKind};
