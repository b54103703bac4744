//! Application configuration. Paths, deployment offset, reporting policies.

use crate::domain::{CostBasis, DomainError, MonthlySeriesPolicy, PeriodResolver, SeriesPlan};
use serde::Deserialize;

/// Upper bound on years in one yearly comparison.
pub const DEFAULT_MAX_COMPARISON_YEARS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding expenses.db. Read from EXPENSES_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Deployment offset in minutes east of UTC; every calendar date is read in it.
    /// Read from EXPENSES_UTC_OFFSET_MINUTES.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// `price` (default) or `quantity_times_price`. Read from EXPENSES_COST_BASIS.
    #[serde(default)]
    pub cost_basis: Option<CostBasis>,

    /// `full_year` (default) or `through_current_month`. Read from EXPENSES_MONTHLY_SERIES.
    #[serde(default)]
    pub monthly_series: Option<MonthlySeriesPolicy>,

    /// Read from EXPENSES_MAX_COMPARISON_YEARS.
    #[serde(default)]
    pub max_comparison_years: Option<u32>,

    /// CSV imported into the store at startup. Read from EXPENSES_SEED_CSV.
    #[serde(default)]
    pub seed_csv: Option<String>,

    /// Keep everything in memory instead of SQLite. Read from EXPENSES_IN_MEMORY.
    #[serde(default)]
    pub in_memory: Option<bool>,

    /// `table` (default) or `json`. Read from EXPENSES_OUTPUT.
    #[serde(default)]
    pub output: Option<OutputFormat>,
}

impl AppConfig {
    /// Fails on any value that does not decode; there is no silent fallback to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("EXPENSES").try_parsing(true));
        if let Ok(path) = std::env::var("EXPENSES_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the data directory. Defaults to ./data.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Resolver for the configured offset. Defaults to UTC.
    pub fn resolver(&self) -> Result<PeriodResolver, DomainError> {
        PeriodResolver::from_offset_minutes(self.utc_offset_minutes.unwrap_or(0))
    }

    pub fn cost_basis_or_default(&self) -> CostBasis {
        self.cost_basis.unwrap_or_default()
    }

    pub fn monthly_series_or_default(&self) -> MonthlySeriesPolicy {
        self.monthly_series.unwrap_or_default()
    }

    /// Returns the yearly comparison cap. Defaults to DEFAULT_MAX_COMPARISON_YEARS.
    pub fn max_comparison_years_or_default(&self) -> u32 {
        self.max_comparison_years
            .unwrap_or(DEFAULT_MAX_COMPARISON_YEARS)
    }

    pub fn series_plan(&self) -> Result<SeriesPlan, DomainError> {
        Ok(SeriesPlan {
            resolver: self.resolver()?,
            policy: self.monthly_series_or_default(),
            max_years: self.max_comparison_years_or_default(),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory.unwrap_or(false)
    }

    pub fn output_or_default(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }
}
