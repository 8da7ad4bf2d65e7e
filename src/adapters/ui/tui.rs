//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Collects run parameters (operator tag, mode, credentials file, verbosity),
//! parses the credential block, and starts the batch.

use crate::domain::{entities::parse_credential_block, DomainError, Mode};
use crate::ports::InputPort;
use crate::shared::config::AppConfig;
use crate::usecases::BatchService;
use async_trait::async_trait;
use inquire::{Confirm, Select, Text};
use std::sync::Arc;

fn mode_options() -> Vec<&'static str> {
    vec!["auto", "login", "restore"]
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    service: Arc<BatchService>,
    defaults: AppConfig,
}

impl TuiInputPort {
    pub fn new(service: Arc<BatchService>, defaults: AppConfig) -> Self {
        Self { service, defaults }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let operator_tag = Text::new("Operator tag (who is running this?):")
            .with_default(&self.defaults.operator_tag_or_default())
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?;

        let mode: Mode = Select::new("Mode", mode_options())
            .with_starting_cursor(
                mode_options()
                    .iter()
                    .position(|m| *m == self.defaults.mode_or_default())
                    .unwrap_or(0),
            )
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?
            .parse()?;

        let path = Text::new("Credentials file (one `name,password` per line):")
            .with_default(&self.defaults.credentials_path_or_default())
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?;

        let verbose = Confirm::new("Verbose failure diagnostics?")
            .with_default(self.defaults.verbose_or_default())
            .prompt()
            .map_err(|e| DomainError::Config(e.to_string()))?;

        let block = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::Config(format!("cannot read {:?}: {}", path, e)))?;
        let credentials = parse_credential_block(&block)?;
        if credentials.is_empty() {
            return Err(DomainError::Config(format!(
                "no credentials found in {:?}",
                path
            )));
        }

        self.service
            .start(
                &operator_tag,
                self.defaults.rate_limit_or_default(),
                mode,
                &credentials,
                verbose,
            )
            .await
    }
}
