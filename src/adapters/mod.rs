//! Infrastructure adapters. Implement outbound ports.
//!
//! SQLite, memory, CSV import, wall clock, terminal UI. Map errors to DomainError.

pub mod clock;
pub mod import;
pub mod persistence;
pub mod ui;
