//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: terminal or other front end drives the report use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive report loop until the user quits.
    async fn run(&self) -> Result<(), DomainError>;
}
