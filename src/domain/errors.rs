//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Registry API error: {0}")]
    Api(String),

    #[error("Side-channel submission failed: {0}")]
    Submit(String),

    #[error("Confirmation gate error: {0}")]
    Confirm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A `start` call arrived while a run was already in flight.
    #[error("A run is already in progress")]
    Busy,
}
