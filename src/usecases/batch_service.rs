//! Credential-batch orchestrator: sequential login/restore/auto over a credential list.
//!
//! - Strictly sequential: one side-channel submission in flight at any instant
//! - Cancellation is cooperative, checked at the top of each credential iteration
//! - Pause is a 1 s cooperative poll between credentials
//! - Per-credential failures are classified and streamed to the run log; nothing
//!   aborts the batch
//! - The registry client is opened per run and cleaned up exactly once on every
//!   exit path

use crate::domain::{Credential, DomainError, LogLevel, Mode, Outcome, SubmitKind};
use crate::ports::{AccountApiPort, ApiFactoryPort, RunLogPort, SubmitPort};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A login counts as confirmed when the remote last-login stamp is at most this
/// many seconds old. Absorbs clock skew and remote processing latency; the
/// remote side gives no direct acknowledgement to check instead.
const FRESHNESS_WINDOW_SECS: i64 = 30;

/// Pause-gate poll interval; bounds pause/resume detection latency.
const PAUSE_POLL: Duration = Duration::from_secs(1);

/// Registry API field holding the epoch-seconds last-login stamp.
const LAST_LOGIN_FIELD: &str = "lastlogin";

/// Registry API field used as a bare existence probe.
const NAME_FIELD: &str = "name";

const PRODUCT_TAG: &str = concat!("account-keeper/", env!("CARGO_PKG_VERSION"));
const MAINTAINER: &str = "account-keeper contributors";

/// Client identity string for a run, embedded into the API client's User-Agent
/// and passed along with every side-channel submission.
pub fn compose_identity(operator_tag: &str) -> String {
    format!(
        "{} (maintained by {}, currently used by \"{}\")",
        PRODUCT_TAG, MAINTAINER, operator_tag
    )
}

/// Per-run collaborators threaded through the procedures.
struct RunContext {
    api: Arc<dyn AccountApiPort>,
    identity: String,
    verbose: bool,
}

/// Batch orchestrator. One instance is reusable across sequential runs; a
/// `start` while another run is in flight fails with [`DomainError::Busy`].
pub struct BatchService {
    api_factory: Arc<dyn ApiFactoryPort>,
    submitter: Arc<dyn SubmitPort>,
    log: Arc<dyn RunLogPort>,
    cancelled: AtomicBool,
    paused: AtomicBool,
    busy: AtomicBool,
}

impl BatchService {
    pub fn new(
        api_factory: Arc<dyn ApiFactoryPort>,
        submitter: Arc<dyn SubmitPort>,
        log: Arc<dyn RunLogPort>,
    ) -> Self {
        Self {
            api_factory,
            submitter,
            log,
            cancelled: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            busy: AtomicBool::new(false),
        }
    }

    /// Run one batch. Opens a registry client scoped to this run, dispatches on
    /// `mode`, streams one outcome line per credential, and always releases the
    /// client exactly once before signaling finish.
    ///
    /// An empty credential list is a no-op that completes immediately.
    pub async fn start(
        &self,
        operator_tag: &str,
        rate_limit: u32,
        mode: Mode,
        credentials: &[Credential],
        verbose: bool,
    ) -> Result<(), DomainError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DomainError::Busy);
        }
        self.cancelled.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        let identity = compose_identity(operator_tag);
        let api = self.api_factory.open(&identity, rate_limit);
        self.log.log(
            LogLevel::Info,
            &format!("Starting {} run ({} account(s))", mode, credentials.len()),
        );

        let ctx = RunContext {
            api: Arc::clone(&api),
            identity,
            verbose,
        };
        match mode {
            Mode::Login => self.run_login(&ctx, credentials).await,
            Mode::Restore => self.run_restore(&ctx, credentials).await,
            Mode::Auto => self.run_auto(&ctx, credentials).await,
        }

        // Exactly once, on every exit path: the procedures never escape.
        api.cleanup().await;

        if self.cancelled.load(Ordering::SeqCst) {
            self.log.log(LogLevel::Info, "Process cancelled.");
        } else {
            self.log.log(LogLevel::Info, "Process complete.");
        }

        // If the operator paused right at the end, hold the finish signal
        // until unpaused (cancel clears the pause flag and releases this too).
        self.pause_gate().await;
        self.log.handle_finish();
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Request cancellation. Takes effect at the next credential boundary; the
    /// in-flight credential always runs to completion (the side channel has no
    /// abort primitive). Overrides a pending pause. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.log
            .log(LogLevel::Info, "Cancelling after the current account...");
    }

    /// Suspend processing at the next credential boundary. Idempotent.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.log.log(LogLevel::Info, "Paused.");
    }

    /// Resume a paused run (picked up within one poll interval). Idempotent.
    pub fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.log.log(LogLevel::Info, "Resumed.");
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cooperative pause gate: poll-and-sleep until unpaused.
    async fn pause_gate(&self) {
        while self.is_paused() {
            tokio::time::sleep(PAUSE_POLL).await;
        }
    }

    async fn run_login(&self, ctx: &RunContext, credentials: &[Credential]) {
        for credential in credentials {
            if self.is_cancelled() {
                break;
            }
            self.pause_gate().await;
            let outcome = self.login_one(ctx, credential).await;
            self.report(credential, &outcome, ctx);
        }
    }

    async fn run_restore(&self, ctx: &RunContext, credentials: &[Credential]) {
        for credential in credentials {
            if self.is_cancelled() {
                break;
            }
            self.pause_gate().await;
            let outcome = self.restore_one(ctx, credential).await;
            self.report(credential, &outcome, ctx);
        }
    }

    /// Auto is a dispatcher, not a third algorithm: probe existence, then run
    /// the login or restore procedure for this one credential.
    async fn run_auto(&self, ctx: &RunContext, credentials: &[Credential]) {
        for credential in credentials {
            if self.is_cancelled() {
                break;
            }
            self.pause_gate().await;
            let outcome = match ctx.api.request(&credential.account, &[NAME_FIELD]).await {
                Ok(_) => self.login_one(ctx, credential).await,
                Err(_) => self.restore_one(ctx, credential).await,
            };
            self.report(credential, &outcome, ctx);
        }
    }

    /// Submit a login, then infer success from last-login freshness. The
    /// submission gives no acknowledgement; a stamp at most
    /// [`FRESHNESS_WINDOW_SECS`] old is the only observable proxy.
    async fn login_one(&self, ctx: &RunContext, credential: &Credential) -> Outcome {
        if let Err(e) = self
            .submitter
            .submit(SubmitKind::Login, credential, &ctx.identity)
            .await
        {
            return Outcome::LoginFailed {
                detail: Some(e.to_string()),
            };
        }
        match self.last_login_elapsed(ctx, credential).await {
            Ok(elapsed) if elapsed > FRESHNESS_WINDOW_SECS => Outcome::LoginFailed {
                detail: Some(format!(
                    "more than {} seconds between now and last login",
                    FRESHNESS_WINDOW_SECS
                )),
            },
            Ok(_) => Outcome::LoginSucceeded,
            Err(e) => Outcome::LoginFailed {
                detail: Some(e.to_string()),
            },
        }
    }

    /// Seconds between now and the account's last login. `now` is sampled
    /// after the field read completes.
    async fn last_login_elapsed(
        &self,
        ctx: &RunContext,
        credential: &Credential,
    ) -> Result<i64, DomainError> {
        let fields = ctx
            .api
            .request(&credential.account, &[LAST_LOGIN_FIELD])
            .await?;
        let raw = fields.get(LAST_LOGIN_FIELD).ok_or_else(|| {
            DomainError::Api(format!("field {:?} missing from response", LAST_LOGIN_FIELD))
        })?;
        let stamp: i64 = raw.trim().parse().map_err(|_| {
            DomainError::Api(format!("unparseable last-login timestamp {:?}", raw))
        })?;
        Ok(Utc::now().timestamp() - stamp)
    }

    /// Restore is gated on a human acknowledgement (account recovery is not
    /// reversible), then verified with a bare existence probe. The probe
    /// cannot tell a fresh restore from an account that already existed.
    async fn restore_one(&self, ctx: &RunContext, credential: &Credential) -> Outcome {
        self.log.log(
            LogLevel::Info,
            &format!("{}: waiting for confirmation", credential.account),
        );
        if let Err(e) = self.log.confirm().await {
            return Outcome::RestoreFailed {
                detail: Some(e.to_string()),
            };
        }
        if let Err(e) = self
            .submitter
            .submit(SubmitKind::Restore, credential, &ctx.identity)
            .await
        {
            return Outcome::RestoreFailed {
                detail: Some(e.to_string()),
            };
        }
        match ctx.api.request(&credential.account, &[NAME_FIELD]).await {
            Ok(_) => Outcome::RestoreSucceeded,
            Err(e) => Outcome::RestoreFailed {
                detail: Some(e.to_string()),
            },
        }
    }

    /// Outcome seam: every classification funnels through here, one info/error
    /// line per credential plus one diagnostic line when verbose.
    fn report(&self, credential: &Credential, outcome: &Outcome, ctx: &RunContext) {
        let verbose = ctx.verbose;
        let name = &credential.account;
        match outcome {
            Outcome::LoginSucceeded => self.log.log(
                LogLevel::Info,
                &format!(
                    "{}: Login successful (or account was logged into in the last {} seconds)",
                    name, FRESHNESS_WINDOW_SECS
                ),
            ),
            Outcome::RestoreSucceeded => self.log.log(
                LogLevel::Info,
                &format!("{}: Restore successful (or account already existed)", name),
            ),
            Outcome::LoginFailed { detail } => {
                self.log
                    .log(LogLevel::Error, &format!("{}: Login failed", name));
                if verbose {
                    if let Some(detail) = detail {
                        self.log
                            .log(LogLevel::Error, &format!("{}: {}", name, detail));
                    }
                }
            }
            Outcome::RestoreFailed { detail } => {
                self.log
                    .log(LogLevel::Error, &format!("{}: Restore failed", name));
                if verbose {
                    if let Some(detail) = detail {
                        self.log
                            .log(LogLevel::Error, &format!("{}: {}", name, detail));
                    }
                }
            }
        }
    }
}
