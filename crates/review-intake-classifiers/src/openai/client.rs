use async_trait::async_trait;
use review_intake_models::{SentimentLabel, StarRating};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};
use crate::budget::CallBudget;
use crate::error::{ClassifierError, FailureKind};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::traits::{Classification, LabelProvider, SentimentClassifier};

/// External-call strategy: budget gate, bounded attempts, rating-based fallback.
pub struct ExternalClassifier<P> {
    provider: P,
    budget: Arc<CallBudget>,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl<P: LabelProvider> ExternalClassifier<P> {
    pub fn new(provider: P, budget: Arc<CallBudget>, policy: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            provider,
            budget,
            policy,
            call_timeout,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn attempt(&self, feedback: &str) -> Result<SentimentLabel, FailureKind> {
        let raw = match timeout(self.call_timeout, self.provider.request_label(feedback)).await {
            Ok(result) => result?,
            Err(_) => return Err(FailureKind::Timeout),
        };
        raw.parse::<SentimentLabel>()
            .map_err(|_| FailureKind::InvalidLabel(raw))
    }
}

#[async_trait]
impl<P: LabelProvider> SentimentClassifier for ExternalClassifier<P> {
    fn strategy_name(&self) -> &str {
        "external"
    }

    async fn classify(&self, rating: StarRating, feedback: &str) -> Result<Classification, ClassifierError> {
        self.budget.acquire().await?;

        match retry_with_backoff(&self.policy, |_| self.attempt(feedback)).await {
            Ok((label, attempts)) => {
                info!(
                    operation = "classified",
                    provider = self.provider.provider_name(),
                    sentiment = %label,
                    attempts,
                    "Sentiment classified"
                );
                Ok(Classification::upstream(label, attempts))
            }
            Err(exhausted) => {
                let fallback = SentimentLabel::from_rating(rating);
                warn!(
                    operation = "classification_degraded",
                    provider = self.provider.provider_name(),
                    attempts = exhausted.attempts,
                    last_error = %exhausted.last,
                    fallback = %fallback,
                    rating = rating.value(),
                    feedback_length = feedback.chars().count(),
                    "External classification unavailable, using rating-based sentiment"
                );
                Ok(Classification::fallback(fallback, exhausted.attempts, exhausted.last))
            }
        }
    }
}
