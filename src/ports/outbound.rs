//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Credential, DomainError, LogLevel, SubmitKind};
use std::collections::HashMap;
use std::sync::Arc;

/// Structured registry API. Reads named fields of an account.
///
/// The adapter owns its own request rate limiting; callers never bypass it.
#[async_trait::async_trait]
pub trait AccountApiPort: Send + Sync {
    /// Fetch the given fields of `account` (raw, un-normalized name).
    /// Errors on non-existence as well as on network/protocol failure.
    async fn request(
        &self,
        account: &str,
        fields: &[&str],
    ) -> Result<HashMap<String, String>, DomainError>;

    /// Deterministic resource release. Invoked exactly once per run by the
    /// orchestrator, on every exit path.
    async fn cleanup(&self);
}

/// Builds an [`AccountApiPort`] scoped to one run. The orchestrator constructs
/// a fresh client per `start` call (identity string and rate limit are
/// per-run inputs), so client construction itself sits behind a seam.
pub trait ApiFactoryPort: Send + Sync {
    /// `identity` becomes the client's User-Agent; `rate_limit` is the max
    /// requests allowed per rate window.
    fn open(&self, identity: &str, rate_limit: u32) -> Arc<dyn AccountApiPort>;
}

/// Side-channel submitter: performs the unobservable login/restore form post.
///
/// Contract: the submission is fire-and-forget from the remote side; the
/// implementation waits a fixed settle delay before resolving, and enforces a
/// hard ceiling after which a Login resolves anyway (the caller has a
/// secondary freshness check) while a Restore rejects (it has none).
#[async_trait::async_trait]
pub trait SubmitPort: Send + Sync {
    async fn submit(
        &self,
        kind: SubmitKind,
        credential: &Credential,
        identity: &str,
    ) -> Result<(), DomainError>;
}

/// Run log: append-only leveled lines, a human confirmation gate, and the
/// end-of-run signal.
#[async_trait::async_trait]
pub trait RunLogPort: Send + Sync {
    /// Append one line to the run log.
    fn log(&self, level: LogLevel, message: &str);

    /// Resolves on the next external acknowledgement (human-in-the-loop).
    async fn confirm(&self) -> Result<(), DomainError>;

    /// A run has fully ended; the UI may reset its state.
    fn handle_finish(&self);
}
