//! Side-channel submitter. Implements SubmitPort with an HTTP form post.
//!
//! The remote side returns no machine-readable confirmation for login or
//! restore. After triggering the post we wait a fixed settle delay (remote
//! pacing), under a hard ceiling with asymmetric expiry: a timed-out login
//! resolves (the orchestrator has a secondary freshness check), a timed-out
//! restore rejects (it has no secondary confirmation).

use crate::domain::{Credential, DomainError, SubmitKind};
use crate::ports::SubmitPort;
use reqwest::header::USER_AGENT;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Wait after triggering a submission before considering it complete.
const SETTLE_DELAY: Duration = Duration::from_secs(6);

/// Hard ceiling on the whole submission, settle delay included.
const HARD_CEILING: Duration = Duration::from_secs(15);

/// Apply the hard ceiling with the asymmetric expiry rule.
async fn guard_submission<F>(
    kind: SubmitKind,
    ceiling: Duration,
    submission: F,
) -> Result<(), DomainError>
where
    F: Future<Output = Result<(), DomainError>>,
{
    match tokio::time::timeout(ceiling, submission).await {
        Ok(result) => result,
        // The post may have landed silently; the freshness check decides.
        Err(_) if kind == SubmitKind::Login => Ok(()),
        Err(_) => Err(DomainError::Submit(format!(
            "no response within {} seconds",
            ceiling.as_secs()
        ))),
    }
}

/// Form-post submitter against the remote action endpoint.
pub struct FormSubmitter {
    client: reqwest::Client,
    base_url: String,
    settle: Duration,
    ceiling: Duration,
}

impl FormSubmitter {
    pub fn new(base_url: &str) -> Self {
        Self::with_timing(base_url, SETTLE_DELAY, HARD_CEILING)
    }

    pub fn with_timing(base_url: &str, settle: Duration, ceiling: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settle,
            ceiling,
        }
    }

    async fn post_and_settle(
        &self,
        kind: SubmitKind,
        credential: &Credential,
        identity: &str,
    ) -> Result<(), DomainError> {
        let url = format!("{}/action", self.base_url);
        let account = credential.canonical_name();
        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, identity)
            .form(&[
                ("action", kind.action()),
                ("account", account.as_str()),
                ("password", credential.secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::Submit(format!("form post failed: {}", e)))?;

        // The response is an HTML page with no machine-readable result; only
        // transport failures are observable here.
        debug!(
            status = %response.status(),
            action = kind.action(),
            account = %account,
            "submission triggered, settling"
        );
        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SubmitPort for FormSubmitter {
    async fn submit(
        &self,
        kind: SubmitKind,
        credential: &Credential,
        identity: &str,
    ) -> Result<(), DomainError> {
        guard_submission(kind, self.ceiling, self.post_and_settle(kind, credential, identity))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn login_ceiling_expiry_resolves() {
        let result = guard_submission(
            SubmitKind::Login,
            Duration::from_secs(15),
            std::future::pending(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn restore_ceiling_expiry_rejects() {
        let result = guard_submission(
            SubmitKind::Restore,
            Duration::from_secs(15),
            std::future::pending(),
        )
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("15 seconds"));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_submission_passes_through() {
        let result = guard_submission(SubmitKind::Restore, Duration::from_secs(15), async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok(())
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn submission_error_propagates_even_for_login() {
        let result = guard_submission(SubmitKind::Login, Duration::from_secs(15), async {
            Err(DomainError::Submit("connection refused".into()))
        })
        .await;
        assert!(result.unwrap_err().to_string().contains("connection refused"));
    }
}
