//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/IO types here — these are mapped from adapters.

use serde::{Deserialize, Serialize};

/// One account to process. Read once from operator input, never mutated.
///
/// Identity is `account`. The raw name is what the registry API sees;
/// the side-channel form post uses [`Credential::canonical_name`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub account: String,
    pub secret: String,
}

impl Credential {
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
        }
    }

    /// Normalized form for the side-channel submission: trimmed, lowercased,
    /// internal whitespace runs collapsed to a single `_`.
    pub fn canonical_name(&self) -> String {
        self.account
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Parse an operator-supplied credential block: one `name,password` per line.
/// Blank lines and `#` comments are skipped. The account name is trimmed; the
/// password is everything after the first comma, kept exactly as written
/// (commas and surrounding whitespace survive).
pub fn parse_credential_block(block: &str) -> Result<Vec<Credential>, super::DomainError> {
    let mut out = Vec::new();
    for (idx, raw) in block.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match raw.split_once(',') {
            Some((name, secret)) if !name.trim().is_empty() && !secret.trim().is_empty() => {
                out.push(Credential::new(name.trim(), secret));
            }
            _ => {
                return Err(super::DomainError::Config(format!(
                    "line {}: expected `name,password`, got {:?}",
                    idx + 1,
                    trimmed
                )));
            }
        }
    }
    Ok(out)
}

/// Operating mode for a run. Immutable input to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Login,
    Restore,
    Auto,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Login => write!(f, "login"),
            Mode::Restore => write!(f, "restore"),
            Mode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = super::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "login" => Ok(Mode::Login),
            "restore" => Ok(Mode::Restore),
            "auto" => Ok(Mode::Auto),
            other => Err(super::DomainError::Config(format!(
                "unknown mode {:?} (expected login, restore or auto)",
                other
            ))),
        }
    }
}

/// Which side-channel action a submission performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Login,
    Restore,
}

impl SubmitKind {
    pub fn action(self) -> &'static str {
        match self {
            SubmitKind::Login => "login",
            SubmitKind::Restore => "restore",
        }
    }
}

/// Classification of one processed credential. Streamed to the run log,
/// never collected into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    LoginSucceeded,
    LoginFailed { detail: Option<String> },
    RestoreSucceeded,
    RestoreFailed { detail: Option<String> },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::LoginSucceeded | Outcome::RestoreSucceeded)
    }
}

/// Log line severity for the run log port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_normalizes() {
        let c = Credential::new("  The  Grand Duchy ", "pw");
        assert_eq!(c.canonical_name(), "the_grand_duchy");
    }

    #[test]
    fn canonical_name_leaves_plain_names_alone() {
        let c = Credential::new("testnation", "pw");
        assert_eq!(c.canonical_name(), "testnation");
    }

    #[test]
    fn parse_block_skips_blanks_and_comments() {
        let block = "# puppets\n\nalpha,pw1\n  beta ,pw2\n";
        let creds = parse_credential_block(block).unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].account, "alpha");
        assert_eq!(creds[1].account, "beta");
        assert_eq!(creds[1].secret, "pw2");
    }

    #[test]
    fn parse_block_keeps_secret_exactly_as_written() {
        // Only the account name is normalized; the password after the first
        // comma is opaque, including commas and surrounding whitespace.
        let creds = parse_credential_block("alpha,  p,w 1 ").unwrap();
        assert_eq!(creds[0].account, "alpha");
        assert_eq!(creds[0].secret, "  p,w 1 ");
    }

    #[test]
    fn parse_block_rejects_malformed_line() {
        let err = parse_credential_block("alpha,pw\nno-comma-here\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Login".parse::<Mode>().unwrap(), Mode::Login);
        assert_eq!("AUTO".parse::<Mode>().unwrap(), Mode::Auto);
        assert!("banana".parse::<Mode>().is_err());
    }
}
