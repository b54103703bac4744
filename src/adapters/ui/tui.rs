//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Collects a filter or comparison request, hands it to the use cases and prints
//! the result as a plain listing or JSON. Request errors are shown and the loop continues.

use crate::domain::{
    ALL_CATEGORIES, ALL_ITEMS, ComparisonMode, ComparisonRequest, ComparisonSeries, DomainError,
    FilterQuery, Selection,
};
use crate::ports::InputPort;
use crate::shared::config::OutputFormat;
use crate::usecases::{ComparisonService, DirectoryService, FilterResult, ReportService};
use async_trait::async_trait;
use chrono::NaiveDate;
use inquire::{CustomType, Select, Text};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

const MENU_BREAKDOWN: &str = "Breakdown (table / pie data)";
const MENU_RECORDS: &str = "Detailed records";
const MENU_COMPARE: &str = "Compare periods";
const MENU_QUIT: &str = "Quit";

const PERIODS: [&str; 8] = [
    "today",
    "thisWeek",
    "thisMonth",
    "thisYear",
    "day",
    "month",
    "year",
    "customRange",
];

fn prompt_err(e: inquire::InquireError) -> DomainError {
    DomainError::Prompt(e.to_string())
}

/// Blank input means "not given", so missing bounds reach the resolver as such.
fn prompt_date(message: &str) -> Result<Option<NaiveDate>, DomainError> {
    let raw = Text::new(message)
        .with_help_message("YYYY-MM-DD, leave blank to omit")
        .prompt()
        .map_err(prompt_err)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| DomainError::InvalidRange(format!("'{}' is not a date: {}", raw, e)))
}

fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Rollup listing: index, label, total, share.
pub fn render_rollup(result: &FilterResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Period {}", result.interval);
    if result.rollup.is_empty() {
        let _ = writeln!(out, "No records found");
        return out;
    }
    for (i, (entry, share)) in result.rollup.shares().into_iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<24} {:>12.2} {:>4.0}%",
            i + 1,
            entry.label,
            entry.total,
            share * 100.0
        );
    }
    let _ = writeln!(out, "Total: {:.2}", result.rollup.total_of_all);
    out
}

/// Record listing, newest first.
pub fn render_records(result: &FilterResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Period {}", result.interval);
    if result.records.is_empty() {
        let _ = writeln!(out, "No records found");
        return out;
    }
    for (i, r) in result.records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} | {} | {} | qty {} | {:.2} | {}",
            i + 1,
            r.date.format("%Y-%m-%d %H:%M"),
            crate::domain::display_label(&r.category),
            crate::domain::display_label(&r.item),
            r.quantity,
            r.price,
            crate::domain::display_label(&r.person),
        );
    }
    let _ = writeln!(out, "Total: {:.2}", result.total_of_all());
    out
}

pub fn render_series(series: &ComparisonSeries) -> String {
    let mut out = String::new();
    for p in &series.points {
        let _ = writeln!(out, "{:<6} {:>12.2}", p.label, p.total);
    }
    out
}

/// Comparison over the picked category and item; sentinels mean no constraint.
pub fn comparison_request(mode: ComparisonMode, category: &str, item: Option<&str>) -> ComparisonRequest {
    ComparisonRequest {
        mode,
        category: Selection::parse(Some(category), ALL_CATEGORIES),
        item: Selection::parse(item, ALL_ITEMS),
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    reports: Arc<ReportService>,
    comparisons: Arc<ComparisonService>,
    directory: Arc<DirectoryService>,
    output: OutputFormat,
}

impl TuiInputPort {
    pub fn new(
        reports: Arc<ReportService>,
        comparisons: Arc<ComparisonService>,
        directory: Arc<DirectoryService>,
        output: OutputFormat,
    ) -> Self {
        Self {
            reports,
            comparisons,
            directory,
            output,
        }
    }

    /// Category select, then an item select when a concrete category was picked.
    async fn prompt_category_item(&self) -> Result<(String, Option<String>), DomainError> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        categories.extend(self.directory.categories().await?.into_iter().map(|c| c.name));
        let category = Select::new("Category", categories)
            .prompt()
            .map_err(prompt_err)?;

        let item = if Selection::parse(Some(&category), ALL_CATEGORIES).is_all() {
            None
        } else {
            let mut items = vec![ALL_ITEMS.to_string()];
            items.extend(
                self.directory
                    .items_for_category(&category)
                    .await?
                    .into_iter()
                    .map(|i| i.name),
            );
            Some(Select::new("Item", items).prompt().map_err(prompt_err)?)
        };
        Ok((category, item))
    }

    async fn prompt_filter(&self) -> Result<FilterQuery, DomainError> {
        let (category, item) = self.prompt_category_item().await?;
        let period = Select::new("Period", PERIODS.to_vec())
            .prompt()
            .map_err(prompt_err)?;
        let mut query = FilterQuery {
            period: Some(period.to_string()),
            category: Some(category),
            item,
            ..FilterQuery::default()
        };
        match period {
            "day" | "month" | "year" => query.anchor = prompt_date("Anchor date")?,
            "customRange" => {
                query.start_date = prompt_date("Start date")?;
                query.end_date = prompt_date("End date (inclusive)")?;
            }
            _ => {}
        }
        Ok(query)
    }

    async fn prompt_comparison(&self) -> Result<ComparisonRequest, DomainError> {
        let (category, item) = self.prompt_category_item().await?;
        let mode = Select::new("Compare", vec!["Months within a year", "Years within a range"])
            .prompt()
            .map_err(prompt_err)?;
        let mode = if mode.starts_with("Months") {
            let year = CustomType::<i32>::new("Year")
                .prompt()
                .map_err(prompt_err)?;
            ComparisonMode::MonthlyWithinYear { year: Some(year) }
        } else {
            let start = CustomType::<i32>::new("Start year")
                .prompt()
                .map_err(prompt_err)?;
            let end = CustomType::<i32>::new("End year")
                .prompt()
                .map_err(prompt_err)?;
            ComparisonMode::YearlyWithinRange {
                start_year: Some(start),
                end_year: Some(end),
            }
        };
        Ok(comparison_request(mode, &category, item.as_deref()))
    }

    async fn run_once(&self, choice: &str) -> Result<String, DomainError> {
        match choice {
            MENU_BREAKDOWN | MENU_RECORDS => {
                let query = self.prompt_filter().await?;
                let result = self.reports.report_query(query).await?;
                Ok(match (self.output, choice) {
                    (OutputFormat::Json, MENU_RECORDS) => render_json(&result.records),
                    (OutputFormat::Json, _) => render_json(&result.rollup),
                    (OutputFormat::Table, MENU_RECORDS) => render_records(&result),
                    (OutputFormat::Table, _) => render_rollup(&result),
                })
            }
            MENU_COMPARE => {
                let request = self.prompt_comparison().await?;
                let series = self.comparisons.compare(&request).await?;
                Ok(match self.output {
                    OutputFormat::Json => render_json(&series),
                    OutputFormat::Table => render_series(&series),
                })
            }
            _ => Ok(String::new()),
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let choice = Select::new(
                "What do you want to see?",
                vec![MENU_BREAKDOWN, MENU_RECORDS, MENU_COMPARE, MENU_QUIT],
            )
            .prompt()
            .map_err(prompt_err)?;
            if choice == MENU_QUIT {
                return Ok(());
            }
            match self.run_once(choice).await {
                Ok(text) => println!("{}", text),
                Err(DomainError::Prompt(e)) => return Err(DomainError::Prompt(e)),
                Err(e) => {
                    warn!(error = %e, "request failed");
                    println!("Error: {}", e);
                }
            }
        }
    }
}
