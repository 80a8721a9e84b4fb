use review_intake_models::ReviewId;
use std::fmt;
use thiserror::Error;
use crate::store::StoreError;
use crate::validator::ValidationError;

/// Which limit refused the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    Client,
    ClassifierBudget,
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Client => "client",
            RateLimitScope::ClassifierBudget => "classifier_budget",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Too many requests, please try again later ({scope})")]
    RateLimited { scope: RateLimitScope },

    #[error("No review found for this session")]
    ReviewNotFound,

    #[error("Review {0} not found")]
    UnknownReview(ReviewId),

    #[error("Review {0} already has a response")]
    AlreadyResponded(ReviewId),

    #[error("Failed to persist review: {0}")]
    Persistence(#[from] StoreError),
}

impl IntakeError {
    /// Stable machine-readable code
    pub fn reason(&self) -> &'static str {
        match self {
            IntakeError::Validation(e) => e.reason(),
            IntakeError::RateLimited { .. } => "rate_limited",
            IntakeError::ReviewNotFound | IntakeError::UnknownReview(_) => "not_found",
            IntakeError::AlreadyResponded(_) => "already_responded",
            IntakeError::Persistence(_) => "persistence_failed",
        }
    }

    /// HTTP-style status for hosts that front the pipeline with a web layer
    pub fn status_code(&self) -> u16 {
        match self {
            IntakeError::Validation(_) => 400,
            IntakeError::RateLimited { .. } => 429,
            IntakeError::ReviewNotFound | IntakeError::UnknownReview(_) => 404,
            IntakeError::AlreadyResponded(_) => 409,
            IntakeError::Persistence(_) => 500,
        }
    }
}
