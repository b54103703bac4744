//! Import adapters. Read expense rows from external files.

pub mod csv_records;

pub use csv_records::{read_expenses, read_expenses_file};
