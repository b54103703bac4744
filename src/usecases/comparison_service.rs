//! Trend comparison use case: monthly totals within a year, yearly totals within a span.
//!
//! Units are laid out by the period resolver; the store is queried once over the
//! covering interval and each unit is totalled from that snapshot, so a failure
//! never leaves a half-built series behind.

use crate::domain::comparison::{covering, fill};
use crate::domain::{
    ComparisonRequest, ComparisonSeries, CostBasis, DomainError, RecordQuery, SeriesPlan,
};
use crate::ports::{Clock, RecordStore};
use std::sync::Arc;
use tracing::info;

pub struct ComparisonService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    plan: SeriesPlan,
    basis: CostBasis,
}

impl ComparisonService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        plan: SeriesPlan,
        basis: CostBasis,
    ) -> Self {
        Self {
            store,
            clock,
            plan,
            basis,
        }
    }

    pub async fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonSeries, DomainError> {
        let today = self.plan.resolver.local_date(self.clock.now());
        let units = self.plan.units(&request.mode, today)?;
        let Some(span) = covering(&units) else {
            return Ok(ComparisonSeries {
                mode: request.mode,
                points: Vec::new(),
            });
        };
        let query = RecordQuery {
            category: request.category.key().cloned(),
            item: request.item.key().cloned(),
            ..RecordQuery::new(span)
        };
        let records = self.store.find_records(&query).await?;
        let series = fill(request.mode, units, &records, self.basis);
        info!(
            span = %span,
            points = series.points.len(),
            records = records.len(),
            total = series.total(),
            "comparison series built"
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{ComparisonMode, MonthlySeriesPolicy, NewExpense, PeriodResolver, Selection};
    use crate::ports::RecordWriter;
    use chrono::{TimeZone, Utc};

    fn expense(category: &str, price: f64, y: i32, m: u32, d: u32) -> NewExpense {
        NewExpense {
            category: category.into(),
            item: "Misc".into(),
            quantity: 1.0,
            price,
            person: "Dev".into(),
            description: None,
            date: Utc.with_ymd_and_hms(y, m, d, 23, 59, 59).unwrap(),
        }
    }

    async fn service(policy: MonthlySeriesPolicy) -> ComparisonService {
        let store = Arc::new(MemoryStore::new());
        store
            .append_records(&[
                expense("Food", 100.0, 2023, 1, 31),
                expense("food", 50.0, 2023, 12, 31),
                expense("Books", 30.0, 2024, 2, 29),
                expense("Food", 10.0, 2025, 3, 1),
            ])
            .await
            .unwrap();
        ComparisonService::new(
            store,
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap())),
            SeriesPlan {
                resolver: PeriodResolver::utc(),
                policy,
                max_years: 20,
            },
            CostBasis::Price,
        )
    }

    #[tokio::test]
    async fn test_monthly_series_is_zero_filled() {
        let svc = service(MonthlySeriesPolicy::FullYear).await;
        let series = svc.compare(&ComparisonRequest::monthly(2023)).await.unwrap();
        assert_eq!(series.points.len(), 12);
        assert_eq!(series.points[0].label, "Jan");
        assert_eq!(series.points[0].total, 100.0);
        assert_eq!(series.points[11].label, "Dec");
        assert_eq!(series.points[11].total, 50.0);
        assert!(series.points[1..11].iter().all(|p| p.total == 0.0));
    }

    #[tokio::test]
    async fn test_current_year_policy() {
        let svc = service(MonthlySeriesPolicy::ThroughCurrentMonth).await;
        let series = svc.compare(&ComparisonRequest::monthly(2025)).await.unwrap();
        let labels: Vec<&str> = series.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(series.total(), 10.0);
    }

    #[tokio::test]
    async fn test_yearly_series_descends_and_filters() {
        let svc = service(MonthlySeriesPolicy::FullYear).await;
        let series = svc.compare(&ComparisonRequest::yearly(2022, 2025)).await.unwrap();
        let got: Vec<(&str, f64)> = series
            .points
            .iter()
            .map(|p| (p.label.as_str(), p.total))
            .collect();
        assert_eq!(
            got,
            vec![("2025", 10.0), ("2024", 30.0), ("2023", 150.0), ("2022", 0.0)]
        );

        let food_only = ComparisonRequest {
            category: Selection::only("FOOD"),
            ..ComparisonRequest::yearly(2023, 2024)
        };
        let series = svc.compare(&food_only).await.unwrap();
        let totals: Vec<f64> = series.points.iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![0.0, 150.0]);
    }

    #[tokio::test]
    async fn test_reversed_years_rejected() {
        let svc = service(MonthlySeriesPolicy::FullYear).await;
        let err = svc
            .compare(&ComparisonRequest::yearly(2025, 2022))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange(_)));

        let missing = ComparisonRequest {
            mode: ComparisonMode::YearlyWithinRange {
                start_year: None,
                end_year: Some(2024),
            },
            category: Selection::All,
            item: Selection::All,
        };
        assert!(svc.compare(&missing).await.is_err());
    }
}
