//! Comparison series: per-month totals within a year, or per-year totals within a span.

use super::entities::ExpenseRecord;
use super::errors::DomainError;
use super::filter::Selection;
use super::period::{Interval, PeriodResolver};
use super::rollup::CostBasis;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Whether the monthly series for the current year stops at the current month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlySeriesPolicy {
    /// Always twelve entries, zero-filled.
    #[default]
    FullYear,
    /// Current year ends at today's month; other years still get twelve.
    ThroughCurrentMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ComparisonMode {
    MonthlyWithinYear {
        year: Option<i32>,
    },
    /// Inclusive on both ends.
    YearlyWithinRange {
        start_year: Option<i32>,
        end_year: Option<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub mode: ComparisonMode,
    #[serde(default)]
    pub category: Selection,
    #[serde(default)]
    pub item: Selection,
}

impl ComparisonRequest {
    pub fn monthly(year: i32) -> Self {
        Self {
            mode: ComparisonMode::MonthlyWithinYear { year: Some(year) },
            category: Selection::All,
            item: Selection::All,
        }
    }

    pub fn yearly(start_year: i32, end_year: i32) -> Self {
        Self {
            mode: ComparisonMode::YearlyWithinRange {
                start_year: Some(start_year),
                end_year: Some(end_year),
            },
            category: Selection::All,
            item: Selection::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub interval: Interval,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSeries {
    pub mode: ComparisonMode,
    pub points: Vec<SeriesPoint>,
}

impl ComparisonSeries {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.total).sum()
    }
}

/// Settings that shape how units are laid out.
#[derive(Debug, Clone, Copy)]
pub struct SeriesPlan {
    pub resolver: PeriodResolver,
    pub policy: MonthlySeriesPolicy,
    pub max_years: u32,
}

impl SeriesPlan {
    /// Labelled intervals in emission order: Jan..Dec for monthly, newest year
    /// first for yearly. Fails fast on missing or reversed bounds.
    pub fn units(
        &self,
        mode: &ComparisonMode,
        today: NaiveDate,
    ) -> Result<Vec<(String, Interval)>, DomainError> {
        match *mode {
            ComparisonMode::MonthlyWithinYear { year } => {
                let year = year.ok_or_else(|| {
                    DomainError::InvalidRange("monthly comparison needs a year".into())
                })?;
                let last_month = match self.policy {
                    MonthlySeriesPolicy::ThroughCurrentMonth if year == today.year() => {
                        today.month()
                    }
                    _ => 12,
                };
                (1..=last_month)
                    .map(|m| {
                        let label = MONTH_LABELS[(m - 1) as usize].to_string();
                        self.resolver.month(year, m).map(|iv| (label, iv))
                    })
                    .collect()
            }
            ComparisonMode::YearlyWithinRange {
                start_year,
                end_year,
            } => {
                let (start, end) = match (start_year, end_year) {
                    (Some(s), Some(e)) => (s, e),
                    _ => {
                        return Err(DomainError::InvalidRange(
                            "yearly comparison needs both a start and an end year".into(),
                        ));
                    }
                };
                if start > end {
                    return Err(DomainError::InvalidRange(format!(
                        "start year {} is after end year {}",
                        start, end
                    )));
                }
                let span = i64::from(end) - i64::from(start) + 1;
                if span > i64::from(self.max_years) {
                    return Err(DomainError::InvalidRange(format!(
                        "{} years requested, at most {} allowed",
                        span, self.max_years
                    )));
                }
                (start..=end)
                    .rev()
                    .map(|y| self.resolver.year(y).map(|iv| (y.to_string(), iv)))
                    .collect()
            }
        }
    }
}

/// Interval covering every unit. `None` when there are no units.
pub fn covering(units: &[(String, Interval)]) -> Option<Interval> {
    let (_, first) = units.first()?;
    Some(units.iter().fold(*first, |acc, (_, iv)| acc.span(iv)))
}

/// Sum each unit over `records`; units with nothing in them are zero.
pub fn fill(
    mode: ComparisonMode,
    units: Vec<(String, Interval)>,
    records: &[ExpenseRecord],
    basis: CostBasis,
) -> ComparisonSeries {
    let points = units
        .into_iter()
        .map(|(label, interval)| {
            let total = records
                .iter()
                .filter(|r| interval.contains(r.date))
                .map(|r| basis.amount(r))
                .sum();
            SeriesPoint {
                label,
                interval,
                total,
            }
        })
        .collect();
    ComparisonSeries { mode, points }
}
