//! Filter and rollup use case: request -> interval -> matched records -> one rollup.
//!
//! - Validates the request and resolves the interval before touching the store
//! - Store failures are passed through unchanged (no retry)
//! - One aggregation per request; every projection (table, pie, breakdown) reads the same result

use crate::domain::rollup::total_of;
use crate::domain::{
    CostBasis, DomainError, ExpenseRecord, FilterQuery, FilterRequest, Interval, PeriodResolver,
    Rollup, RollupKind,
};
use crate::ports::{Clock, RecordStore};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable answer to one filter request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub request: FilterRequest,
    pub interval: Interval,
    /// Newest first.
    pub records: Vec<ExpenseRecord>,
    pub rollup: Rollup,
}

impl FilterResult {
    pub fn total_of_all(&self) -> f64 {
        self.rollup.total_of_all
    }
}

/// Report service. Stateless apart from its collaborators; safe to share across tasks.
pub struct ReportService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    resolver: PeriodResolver,
    basis: CostBasis,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        resolver: PeriodResolver,
        basis: CostBasis,
    ) -> Self {
        Self {
            store,
            clock,
            resolver,
            basis,
        }
    }

    /// Today's calendar date in the deployment offset.
    pub fn today(&self) -> NaiveDate {
        self.resolver.local_date(self.clock.now())
    }

    /// Matching records, newest first. Empty when nothing matches.
    pub async fn filter_records(
        &self,
        request: &FilterRequest,
    ) -> Result<(Interval, Vec<ExpenseRecord>), DomainError> {
        let query = request.to_query(&self.resolver)?;
        let records = self.store.find_records(&query).await?;
        debug!(
            interval = %query.interval,
            category = ?query.category,
            item = ?query.item,
            matched = records.len(),
            "filtered records"
        );
        Ok((query.interval, records))
    }

    /// Filter, then roll up along the dimension the request leaves open.
    pub async fn report(&self, request: FilterRequest) -> Result<FilterResult, DomainError> {
        let (interval, records) = self.filter_records(&request).await?;
        let kind = RollupKind::for_request(&request);
        let rollup = Rollup::compute(kind, &records, self.basis);
        info!(
            interval = %interval,
            kind = ?kind,
            records = records.len(),
            groups = rollup.entries.len(),
            total = rollup.total_of_all,
            "report computed"
        );
        Ok(FilterResult {
            request,
            interval,
            records,
            rollup,
        })
    }

    /// Decode a wire query against today's date, then report.
    pub async fn report_query(&self, query: FilterQuery) -> Result<FilterResult, DomainError> {
        let request = query.into_request(self.today())?;
        self.report(request).await
    }

    /// Total cost over a request without grouping.
    pub async fn total(&self, request: &FilterRequest) -> Result<(f64, usize), DomainError> {
        let (_, records) = self.filter_records(request).await?;
        Ok((total_of(&records, self.basis), records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{NewExpense, PeriodSelector, RecordQuery};
    use crate::ports::RecordWriter;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn expense(category: &str, item: &str, person: &str, price: f64, ymd: (i32, u32, u32)) -> NewExpense {
        NewExpense {
            category: category.into(),
            item: item.into(),
            quantity: 1.0,
            price,
            person: person.into(),
            description: None,
            date: Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 9, 30, 0).unwrap(),
        }
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .append_records(&[
                expense("Food", "Dal", "asha", 100.0, (2024, 1, 5)),
                expense("food", "Rice", "ravi", 50.0, (2024, 1, 20)),
                expense("Books", "Novel", "asha", 30.0, (2024, 2, 1)),
                expense("Food Services", "Catering", "asha", 400.0, (2024, 3, 3)),
                expense("Food", "Rice", "Asha", 20.0, (2024, 3, 9)),
            ])
            .await
            .unwrap();
        store
    }

    fn service(store: Arc<dyn RecordStore>) -> ReportService {
        ReportService::new(
            store,
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 9, 18, 0, 0).unwrap())),
            PeriodResolver::utc(),
            CostBasis::Price,
        )
    }

    fn year_2024() -> FilterRequest {
        FilterRequest::new(PeriodSelector::Year {
            anchor: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_category_report_over_year() {
        let svc = service(seeded().await);
        let result = svc.report(year_2024()).await.unwrap();
        let got: Vec<(&str, f64)> = result
            .rollup
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.total))
            .collect();
        assert_eq!(
            got,
            vec![("Food", 170.0), ("Books", 30.0), ("Food Services", 400.0)]
        );
        assert_eq!(result.total_of_all(), 600.0);
        assert_eq!(result.records.len(), 5);
        assert_eq!(result.records[0].item, "Rice");
    }

    #[tokio::test]
    async fn test_pinned_category_rolls_up_items() {
        let svc = service(seeded().await);
        let result = svc.report(year_2024().with_category("FOOD")).await.unwrap();
        assert_eq!(result.rollup.kind, RollupKind::Item);
        let got: Vec<(&str, f64)> = result
            .rollup
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.total))
            .collect();
        assert_eq!(got, vec![("Dal", 100.0), ("Rice", 70.0)]);
    }

    #[tokio::test]
    async fn test_pinned_item_rolls_up_people() {
        let svc = service(seeded().await);
        let result = svc
            .report(year_2024().with_category("food").with_item("rice"))
            .await
            .unwrap();
        assert_eq!(result.rollup.kind, RollupKind::Person);
        let got: Vec<(&str, f64)> = result
            .rollup
            .entries
            .iter()
            .map(|e| (e.label.as_str(), e.total))
            .collect();
        assert_eq!(got, vec![("Ravi", 50.0), ("Asha", 20.0)]);
    }

    #[tokio::test]
    async fn test_relative_query_uses_clock() {
        let svc = service(seeded().await);
        let result = svc
            .report_query(FilterQuery {
                period: Some("today".into()),
                ..FilterQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.total_of_all(), 20.0);

        let (total, count) = svc
            .total(&FilterRequest::new(PeriodSelector::Month {
                anchor: svc.today(),
            }))
            .await
            .unwrap();
        assert_eq!((total, count), (420.0, 2));
    }

    #[tokio::test]
    async fn test_empty_window_is_not_an_error() {
        let svc = service(seeded().await);
        let result = svc
            .report(FilterRequest::new(PeriodSelector::Day {
                anchor: chrono::NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            }))
            .await
            .unwrap();
        assert!(result.records.is_empty());
        assert!(result.rollup.is_empty());
        assert_eq!(result.total_of_all(), 0.0);
    }

    struct DownStore {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RecordStore for DownStore {
        async fn find_records(
            &self,
            _query: &RecordQuery,
        ) -> Result<Vec<ExpenseRecord>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::StoreUnavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_invalid_range_fails_before_store_and_store_errors_pass_through() {
        let down = Arc::new(DownStore {
            calls: AtomicUsize::new(0),
        });
        let svc = service(down.clone());

        let bad = FilterRequest::new(PeriodSelector::CustomRange {
            start: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            end: None,
        });
        assert!(matches!(
            svc.report(bad).await,
            Err(DomainError::InvalidRange(_))
        ));
        assert_eq!(down.calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            svc.report(year_2024()).await.unwrap_err(),
            DomainError::StoreUnavailable("connection refused".into())
        );
        assert_eq!(down.calls.load(Ordering::SeqCst), 1);
    }
}
