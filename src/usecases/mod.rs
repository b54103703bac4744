//! Application use cases. Orchestrate domain logic via ports.

pub mod comparison_service;
pub mod directory_service;
pub mod import_service;
pub mod report_service;

pub use comparison_service::ComparisonService;
pub use directory_service::DirectoryService;
pub use import_service::{ImportService, ImportStats};
pub use report_service::{FilterResult, ReportService};
