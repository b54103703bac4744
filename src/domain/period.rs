//! Period resolution: turn a period selector into a half-open UTC interval.
//!
//! Calendar dates are read as local midnights in one fixed deployment offset and
//! then converted to UTC, so a request means the same instant on every client.

use super::errors::DomainError;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
    CustomRange,
}

/// Parsed period name. `relative` marks the `today` / `this*` spellings, which
/// default their anchor to the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodName {
    pub kind: PeriodKind,
    pub relative: bool,
}

impl FromStr for PeriodName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, relative) = match s.trim().to_ascii_lowercase().as_str() {
            "day" | "date" => (PeriodKind::Day, false),
            "today" => (PeriodKind::Day, true),
            "week" => (PeriodKind::Week, false),
            "thisweek" => (PeriodKind::Week, true),
            "month" => (PeriodKind::Month, false),
            "thismonth" => (PeriodKind::Month, true),
            "year" => (PeriodKind::Year, false),
            "thisyear" => (PeriodKind::Year, true),
            "customrange" | "custom" => (PeriodKind::CustomRange, false),
            other => {
                return Err(DomainError::InvalidPeriod(format!(
                    "unrecognized period '{}'; use day, week, month, year, customRange, \
                     today, thisWeek, thisMonth or thisYear",
                    other
                )));
            }
        };
        Ok(PeriodName { kind, relative })
    }
}

/// A period kind together with its anchor or explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PeriodSelector {
    Day { anchor: NaiveDate },
    /// Sunday-start week containing the anchor.
    Week { anchor: NaiveDate },
    Month { anchor: NaiveDate },
    Year { anchor: NaiveDate },
    /// Both ends inclusive calendar dates. Either may be missing on the wire;
    /// resolution rejects that.
    CustomRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl PeriodSelector {
    /// Build a selector from loose request parts.
    ///
    /// A complete `start`/`end` pair wins over any period name or anchor. Otherwise
    /// relative names (`today`, `thisMonth`, ...) fall back to `today` when no anchor
    /// is given; explicit kinds require one. No period name at all means today.
    pub fn from_parts(
        period: Option<&str>,
        anchor: Option<NaiveDate>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        if start.is_some() && end.is_some() {
            return Ok(PeriodSelector::CustomRange { start, end });
        }
        let name = match period.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.parse::<PeriodName>()?,
            None => PeriodName {
                kind: PeriodKind::Day,
                relative: true,
            },
        };
        if name.kind == PeriodKind::CustomRange {
            return Ok(PeriodSelector::CustomRange { start, end });
        }
        let anchor = match (anchor, name.relative) {
            (Some(a), _) => a,
            (None, true) => today,
            (None, false) => {
                return Err(DomainError::InvalidRange(format!(
                    "{:?} period requires an anchor date",
                    name.kind
                )));
            }
        };
        Ok(match name.kind {
            PeriodKind::Day => PeriodSelector::Day { anchor },
            PeriodKind::Week => PeriodSelector::Week { anchor },
            PeriodKind::Month => PeriodSelector::Month { anchor },
            PeriodKind::Year => PeriodSelector::Year { anchor },
            PeriodKind::CustomRange => unreachable!("handled above"),
        })
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            PeriodSelector::Day { .. } => PeriodKind::Day,
            PeriodSelector::Week { .. } => PeriodKind::Week,
            PeriodSelector::Month { .. } => PeriodKind::Month,
            PeriodSelector::Year { .. } => PeriodKind::Year,
            PeriodSelector::CustomRange { .. } => PeriodKind::CustomRange,
        }
    }
}

/// Half-open UTC interval `[start, end)`. Always `start < end` once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidRange(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Smallest interval covering both.
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.end.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )
    }
}

/// Resolves selectors against a fixed deployment offset.
#[derive(Debug, Clone, Copy)]
pub struct PeriodResolver {
    offset: FixedOffset,
}

impl Default for PeriodResolver {
    fn default() -> Self {
        Self::utc()
    }
}

impl PeriodResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Offset given in minutes east of UTC. Rejects anything outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, DomainError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| {
                DomainError::InvalidRange(format!("UTC offset of {} minutes is out of range", minutes))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date of `now` in the deployment offset.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn resolve(&self, selector: &PeriodSelector) -> Result<Interval, DomainError> {
        match *selector {
            PeriodSelector::Day { anchor } => self.between(anchor, next_day(anchor)?),
            PeriodSelector::Week { anchor } => {
                let back = i64::from(anchor.weekday().num_days_from_sunday());
                let sunday = anchor
                    .checked_sub_signed(Duration::days(back))
                    .ok_or_else(|| out_of_range(anchor))?;
                let next = sunday
                    .checked_add_signed(Duration::days(7))
                    .ok_or_else(|| out_of_range(anchor))?;
                self.between(sunday, next)
            }
            PeriodSelector::Month { anchor } => self.month(anchor.year(), anchor.month()),
            PeriodSelector::Year { anchor } => self.year(anchor.year()),
            PeriodSelector::CustomRange { start, end } => {
                let (start, end) = match (start, end) {
                    (Some(s), Some(e)) => (s, e),
                    (s, e) => {
                        return Err(DomainError::InvalidRange(format!(
                            "custom range needs both dates (start: {}, end: {})",
                            describe(s),
                            describe(e)
                        )));
                    }
                };
                self.between(start, next_day(end)?)
            }
        }
    }

    /// `[1st of month, 1st of next month)`.
    pub fn month(&self, year: i32, month: u32) -> Result<Interval, DomainError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            DomainError::InvalidRange(format!("no such month {}-{:02}", year, month))
        })?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| out_of_range(first))?;
        self.between(first, next)
    }

    /// `[Jan 1, next Jan 1)`.
    pub fn year(&self, year: i32) -> Result<Interval, DomainError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| DomainError::InvalidRange(format!("no such year {}", year)))?;
        let next =
            NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(|| out_of_range(first))?;
        self.between(first, next)
    }

    fn between(&self, start: NaiveDate, end: NaiveDate) -> Result<Interval, DomainError> {
        Interval::new(self.midnight(start)?, self.midnight(end)?)
    }

    fn midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>, DomainError> {
        self.offset
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| out_of_range(date))
    }
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, DomainError> {
    date.succ_opt().ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> DomainError {
    DomainError::InvalidRange(format!("date {} is outside the supported calendar", date))
}

fn describe(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn utc(y: i32, m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_month_aligns_to_utc_boundaries() {
        let r = PeriodResolver::utc();
        let iv = r.resolve(&PeriodSelector::Month { anchor: d(2024, 3, 17) }).unwrap();
        assert_eq!(iv.start(), utc(2024, 3, 1));
        assert_eq!(iv.end(), utc(2024, 4, 1));
        assert_eq!(
            iv.to_string(),
            "[2024-03-01T00:00:00.000Z, 2024-04-01T00:00:00.000Z)"
        );
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let iv = PeriodResolver::utc().month(2023, 12).unwrap();
        assert_eq!(iv.start(), utc(2023, 12, 1));
        assert_eq!(iv.end(), utc(2024, 1, 1));
    }

    #[test]
    fn test_day_and_year() {
        let r = PeriodResolver::utc();
        let day = r.resolve(&PeriodSelector::Day { anchor: d(2024, 2, 29) }).unwrap();
        assert_eq!(day.start(), utc(2024, 2, 29));
        assert_eq!(day.end(), utc(2024, 3, 1));

        let year = r.resolve(&PeriodSelector::Year { anchor: d(2024, 7, 4) }).unwrap();
        assert_eq!(year.start(), utc(2024, 1, 1));
        assert_eq!(year.end(), utc(2025, 1, 1));
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2024-03-13 is a Wednesday.
        let iv = PeriodResolver::utc()
            .resolve(&PeriodSelector::Week { anchor: d(2024, 3, 13) })
            .unwrap();
        assert_eq!(iv.start(), utc(2024, 3, 10));
        assert_eq!(iv.end(), utc(2024, 3, 17));

        let sunday = PeriodResolver::utc()
            .resolve(&PeriodSelector::Week { anchor: d(2024, 3, 10) })
            .unwrap();
        assert_eq!(sunday, iv);
    }

    #[test]
    fn test_custom_range_end_is_inclusive() {
        let iv = PeriodResolver::utc()
            .resolve(&PeriodSelector::CustomRange {
                start: Some(d(2024, 1, 10)),
                end: Some(d(2024, 1, 12)),
            })
            .unwrap();
        assert_eq!(iv.start(), utc(2024, 1, 10));
        assert_eq!(iv.end(), utc(2024, 1, 13));
        assert!(iv.contains(Utc.with_ymd_and_hms(2024, 1, 12, 23, 59, 59).unwrap()));
        assert!(!iv.contains(utc(2024, 1, 13)));
    }

    #[test]
    fn test_single_day_custom_range_is_valid() {
        let iv = PeriodResolver::utc()
            .resolve(&PeriodSelector::CustomRange {
                start: Some(d(2024, 5, 1)),
                end: Some(d(2024, 5, 1)),
            })
            .unwrap();
        assert!(iv.start() < iv.end());
    }

    #[test]
    fn test_custom_range_missing_end_is_rejected() {
        let err = PeriodResolver::utc()
            .resolve(&PeriodSelector::CustomRange {
                start: Some(d(2024, 1, 10)),
                end: None,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange(_)));
    }

    #[test]
    fn test_reversed_custom_range_is_rejected() {
        let err = PeriodResolver::utc()
            .resolve(&PeriodSelector::CustomRange {
                start: Some(d(2024, 1, 10)),
                end: Some(d(2024, 1, 8)),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange(_)));
    }

    #[test]
    fn test_offset_shifts_local_midnight() {
        // +05:30: local midnight is 18:30 UTC on the previous day.
        let r = PeriodResolver::from_offset_minutes(330).unwrap();
        let iv = r.resolve(&PeriodSelector::Day { anchor: d(2024, 1, 5) }).unwrap();
        assert_eq!(iv.start(), Utc.with_ymd_and_hms(2024, 1, 4, 18, 30, 0).unwrap());
        assert_eq!(iv.end(), Utc.with_ymd_and_hms(2024, 1, 5, 18, 30, 0).unwrap());
        assert_eq!(
            r.local_date(Utc.with_ymd_and_hms(2024, 1, 4, 19, 0, 0).unwrap()),
            d(2024, 1, 5)
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(PeriodResolver::from_offset_minutes(24 * 60).is_err());
        assert!(PeriodResolver::from_offset_minutes(-90).is_ok());
    }

    #[test]
    fn test_from_parts_relative_and_explicit() {
        let today = d(2024, 6, 15);
        assert_eq!(
            PeriodSelector::from_parts(Some("thisMonth"), None, None, None, today).unwrap(),
            PeriodSelector::Month { anchor: today }
        );
        assert_eq!(
            PeriodSelector::from_parts(None, None, None, None, today).unwrap(),
            PeriodSelector::Day { anchor: today }
        );
        assert_eq!(
            PeriodSelector::from_parts(Some("Year"), Some(d(2023, 2, 2)), None, None, today)
                .unwrap(),
            PeriodSelector::Year { anchor: d(2023, 2, 2) }
        );
        assert!(matches!(
            PeriodSelector::from_parts(Some("month"), None, None, None, today),
            Err(DomainError::InvalidRange(_))
        ));
        assert!(matches!(
            PeriodSelector::from_parts(Some("fortnight"), None, None, None, today),
            Err(DomainError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn test_from_parts_full_bounds_win_over_period_name() {
        let today = d(2024, 6, 15);
        let range = |s, e| PeriodSelector::CustomRange {
            start: Some(s),
            end: Some(e),
        };
        // Single-day range sent alongside a plain day period name.
        assert_eq!(
            PeriodSelector::from_parts(Some("Date"), None, Some(d(2024, 3, 1)), Some(d(2024, 3, 1)), today)
                .unwrap(),
            range(d(2024, 3, 1), d(2024, 3, 1))
        );
        assert_eq!(
            PeriodSelector::from_parts(None, None, Some(d(2024, 3, 1)), Some(d(2024, 3, 5)), today)
                .unwrap(),
            range(d(2024, 3, 1), d(2024, 3, 5))
        );
        assert_eq!(
            PeriodSelector::from_parts(
                Some("thisMonth"),
                Some(d(2024, 1, 9)),
                Some(d(2024, 3, 1)),
                Some(d(2024, 3, 5)),
                today
            )
            .unwrap(),
            range(d(2024, 3, 1), d(2024, 3, 5))
        );
        // A lone bound does not override the period name.
        assert_eq!(
            PeriodSelector::from_parts(Some("thisMonth"), None, Some(d(2024, 3, 1)), None, today)
                .unwrap(),
            PeriodSelector::Month { anchor: today }
        );
    }

    #[test]
    fn test_from_parts_custom_keeps_missing_bound_for_resolution() {
        let sel = PeriodSelector::from_parts(
            Some("customRange"),
            None,
            Some(d(2024, 1, 1)),
            None,
            d(2024, 6, 15),
        )
        .unwrap();
        assert_eq!(sel.kind(), PeriodKind::CustomRange);
        assert!(PeriodResolver::utc().resolve(&sel).is_err());
    }
}
