use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The only error a classifier lets escape: every other failure becomes a fallback label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier call budget exhausted ({limit} calls per {}s), try again later", window.as_secs())]
    BudgetExhausted { limit: usize, window: Duration },
}

/// Why a single upstream attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Upstream answered 429
    RateLimited,
    /// No answer within the per-call timeout
    Timeout,
    /// Answer outside the positive/neutral/negative vocabulary
    InvalidLabel(String),
    /// Anything that retrying will not fix (auth, malformed request, transport)
    Unrecoverable(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "upstream rate limited"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::InvalidLabel(label) => write!(f, "invalid label '{}'", label),
            FailureKind::Unrecoverable(reason) => write!(f, "unrecoverable: {}", reason),
        }
    }
}
