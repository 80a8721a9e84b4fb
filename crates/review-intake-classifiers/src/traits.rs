use async_trait::async_trait;
use review_intake_models::{SentimentLabel, StarRating};
use crate::error::{ClassifierError, FailureKind};

/// Result of classifying one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Upstream attempts made; 0 for local strategies
    pub attempts: u32,
    pub degraded: Option<Degradation>,
}

/// Set when the rating-based fallback replaced an upstream answer
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub attempts: u32,
    pub last_failure: FailureKind,
}

impl Classification {
    pub fn local(label: SentimentLabel) -> Self {
        Self { label, attempts: 0, degraded: None }
    }

    pub fn upstream(label: SentimentLabel, attempts: u32) -> Self {
        Self { label, attempts, degraded: None }
    }

    pub fn fallback(label: SentimentLabel, attempts: u32, last_failure: FailureKind) -> Self {
        Self {
            label,
            attempts,
            degraded: Some(Degradation { attempts, last_failure }),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    // Strategy name as used in configuration ("external", "heuristic")
    fn strategy_name(&self) -> &str;

    /// Always yields a label unless a process-wide budget forbids even trying.
    async fn classify(&self, rating: StarRating, feedback: &str) -> Result<Classification, ClassifierError>;
}

/// One raw request to an upstream text classifier.
///
/// Implementations report failures as a [`FailureKind`]; the caller owns retries,
/// timeouts and label validation.
#[async_trait]
pub trait LabelProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn request_label(&self, feedback: &str) -> Result<String, FailureKind>;
}
