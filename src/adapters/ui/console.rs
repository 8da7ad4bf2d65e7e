//! Console run log. Implements RunLogPort.
//!
//! Outcome lines share the app's tracing stream; the confirmation gate is an
//! inquire prompt run on a blocking thread so the runtime keeps turning.

use crate::domain::{DomainError, LogLevel};
use crate::ports::RunLogPort;
use inquire::Confirm;
use tracing::{error, info};

pub struct ConsoleRunLog;

impl ConsoleRunLog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleRunLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RunLogPort for ConsoleRunLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }

    async fn confirm(&self) -> Result<(), DomainError> {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Proceed with this restore?")
                .with_default(true)
                .prompt()
        })
        .await
        .map_err(|e| DomainError::Confirm(format!("prompt task failed: {}", e)))?
        .map_err(|e| DomainError::Confirm(e.to_string()))?;

        if answer {
            Ok(())
        } else {
            Err(DomainError::Confirm("declined by operator".into()))
        }
    }

    fn handle_finish(&self) {
        info!("Run finished.");
    }
}
