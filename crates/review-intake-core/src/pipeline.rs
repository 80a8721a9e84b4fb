//! Review intake: validate, admit, classify, persist and route a submission,
//! then carry the customer through the feedback and contact steps.

use chrono::Utc;
use review_intake_classifiers::{ClassifierError, SentimentClassifier};
use review_intake_models::{
    ContactSubmission, CorrelationToken, NewReview, Priority, RedirectTarget, Review, ReviewId,
    ReviewResponse, ReviewSubmission, SentimentLabel,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use crate::error::{IntakeError, RateLimitScope};
use crate::rate_limiter::RateLimiter;
use crate::routing::{carries_feedback, route_after_contact, route_after_feedback_detail, route_submission};
use crate::store::{ReviewChange, ReviewStore, StoreError};
use crate::triage::extract_tags;
use crate::validator::{screen_free_text, validate_contact, validate_submission, ValidationError};

pub const INTAKE_SOURCE: &str = "website";

/// Where a submission is in the intake flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    Received,
    Validated,
    Admitted,
    Classified,
    Persisted,
    Routed,
}

impl fmt::Display for IntakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntakeStage::Received => "received",
            IntakeStage::Validated => "validated",
            IntakeStage::Admitted => "admitted",
            IntakeStage::Classified => "classified",
            IntakeStage::Persisted => "persisted",
            IntakeStage::Routed => "routed",
        };
        f.write_str(name)
    }
}

/// Handle for the wizard steps that follow a submission
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRef {
    pub id: ReviewId,
    pub token: CorrelationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub redirect: RedirectTarget,
    /// None when the review could not be saved; routing still happened
    pub review_ref: Option<ReviewRef>,
    pub sentiment: SentimentLabel,
    pub degraded: bool,
    pub carried_feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub redirect: RedirectTarget,
}

pub struct ReviewPipeline {
    limiter: Arc<RateLimiter>,
    classifier: Arc<dyn SentimentClassifier>,
    store: Arc<dyn ReviewStore>,
    business_id: u64,
}

impl ReviewPipeline {
    pub fn new(
        limiter: Arc<RateLimiter>,
        classifier: Arc<dyn SentimentClassifier>,
        store: Arc<dyn ReviewStore>,
        business_id: u64,
    ) -> Self {
        Self { limiter, classifier, store, business_id }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn store(&self) -> &Arc<dyn ReviewStore> {
        &self.store
    }

    pub fn business_id(&self) -> u64 {
        self.business_id
    }

    #[instrument(skip_all, fields(client = client_key))]
    pub async fn submit_review(
        &self,
        submission: &ReviewSubmission,
        client_key: &str,
    ) -> Result<SubmissionOutcome, IntakeError> {
        debug!(stage = %IntakeStage::Received);

        let validated = validate_submission(submission).map_err(|e| {
            info!(operation = "submission_rejected", reason = e.reason(), "Submission failed validation");
            e
        })?;
        debug!(stage = %IntakeStage::Validated, rating = validated.rating.value());

        if !self.limiter.check(client_key).await {
            warn!(operation = "rate_limited", scope = "client", "Client exceeded submission rate");
            return Err(IntakeError::RateLimited { scope: RateLimitScope::Client });
        }
        debug!(stage = %IntakeStage::Admitted);

        let classification = match self.classifier.classify(validated.rating, &validated.feedback).await {
            Ok(classification) => classification,
            Err(ClassifierError::BudgetExhausted { limit, window }) => {
                warn!(
                    operation = "rate_limited",
                    scope = "classifier_budget",
                    limit,
                    window_secs = window.as_secs(),
                    "Classifier call budget exhausted"
                );
                return Err(IntakeError::RateLimited { scope: RateLimitScope::ClassifierBudget });
            }
        };
        let sentiment = classification.label;
        debug!(stage = %IntakeStage::Classified, sentiment = %sentiment, degraded = classification.is_degraded());

        let token = CorrelationToken::generate();
        let new_review = NewReview {
            business_id: self.business_id,
            rating: validated.rating,
            text: validated.feedback.clone(),
            sentiment,
            created_at: Utc::now(),
            priority: Priority::from_rating(validated.rating),
            source: Some(INTAKE_SOURCE.to_string()),
            tags: extract_tags(validated.rating, &validated.feedback),
            correlation_token: Some(token.clone()),
            customer_name: None,
            contact_info: None,
            improvement_feedback: None,
        };

        let review_ref = match self.store.create(new_review).await {
            Ok(review) => {
                debug!(stage = %IntakeStage::Persisted, review_id = review.id);
                Some(ReviewRef { id: review.id, token })
            }
            Err(e) => {
                error!(operation = "persistence_failed", error = %e, "Failed to save review, routing anyway");
                None
            }
        };

        let redirect = route_submission(validated.rating, sentiment);
        info!(
            operation = "review_submitted",
            stage = %IntakeStage::Routed,
            rating = validated.rating.value(),
            sentiment = %sentiment,
            redirect = %redirect,
            degraded = classification.is_degraded(),
            review_id = review_ref.as_ref().map(|r| r.id),
            "Review submitted"
        );

        Ok(SubmissionOutcome {
            redirect,
            carried_feedback: carries_feedback(redirect).then(|| validated.feedback),
            review_ref,
            sentiment,
            degraded: classification.is_degraded(),
        })
    }

    /// Attach improvement text and areas to the review created under `token`
    #[instrument(skip_all)]
    pub async fn submit_feedback_detail(
        &self,
        token: &CorrelationToken,
        text: &str,
        areas: &[String],
    ) -> Result<StepOutcome, IntakeError> {
        let text = screen_free_text(text)?;
        let areas = areas
            .iter()
            .map(|a| screen_free_text(a))
            .filter(|a| !matches!(a, Ok(s) if s.is_empty()))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let review_id = self.review_id_for(token).await?;
        let area_count = areas.len();
        self.apply_to_session(review_id, ReviewChange::Improvement { feedback: text, areas })
            .await?;

        info!(operation = "feedback_detail", review_id, areas = area_count);
        Ok(StepOutcome { redirect: route_after_feedback_detail() })
    }

    /// Record contact details, or send the customer off if they declined
    #[instrument(skip_all, fields(wants_contact = contact.wants_contact))]
    pub async fn submit_contact_info(
        &self,
        token: &CorrelationToken,
        contact: &ContactSubmission,
    ) -> Result<StepOutcome, IntakeError> {
        if !contact.wants_contact {
            debug!("Customer declined contact");
            return Ok(StepOutcome { redirect: route_after_contact(false) });
        }

        let info = validate_contact(contact)?;
        let preferred = info.preferred_contact;
        let review_id = self.review_id_for(token).await?;
        self.apply_to_session(review_id, ReviewChange::Contact(info)).await?;

        info!(operation = "contact_info", review_id, preferred = ?preferred, "Contact details recorded");
        Ok(StepOutcome { redirect: route_after_contact(true) })
    }

    /// Staff reply to a review; at most one per review
    #[instrument(skip(self, text))]
    pub async fn respond_to_review(
        &self,
        review_id: ReviewId,
        responder_id: u64,
        text: &str,
    ) -> Result<ReviewResponse, IntakeError> {
        let text = screen_free_text(text)?;
        if text.is_empty() {
            return Err(ValidationError::InvalidLength.into());
        }

        if self.store.find_response(review_id).await?.is_some() {
            return Err(IntakeError::AlreadyResponded(review_id));
        }

        // The store re-checks both conditions and marks the review responded
        // in the same write as the response.
        let response = ReviewResponse {
            review_id,
            responder_id,
            text,
            created_at: Utc::now(),
        };
        self.store
            .create_response(response.clone())
            .await
            .map_err(|e| match e {
                StoreError::DuplicateResponse(id) => IntakeError::AlreadyResponded(id),
                StoreError::NotFound(id) => IntakeError::UnknownReview(id),
                other => IntakeError::Persistence(other),
            })?;

        info!(operation = "review_responded", review_id, responder_id, "Response recorded");
        Ok(response)
    }

    /// new -> read. Returns false when the review was already read or responded to.
    pub async fn mark_read(&self, review_id: ReviewId) -> Result<bool, IntakeError> {
        let changed = self
            .store
            .apply(review_id, ReviewChange::MarkRead, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => IntakeError::UnknownReview(id),
                other => IntakeError::Persistence(other),
            })?;
        if changed {
            debug!(review_id, "Marked review read");
        }
        Ok(changed)
    }

    pub async fn recent_reviews(&self, limit: usize) -> Result<Vec<Review>, IntakeError> {
        Ok(self.store.find_recent_for_business(self.business_id, limit).await?)
    }

    async fn review_id_for(&self, token: &CorrelationToken) -> Result<ReviewId, IntakeError> {
        self.store
            .find_by_correlation(token)
            .await?
            .map(|review| review.id)
            .ok_or(IntakeError::ReviewNotFound)
    }

    /// A review deleted between lookup and write reads as an unknown session
    async fn apply_to_session(&self, review_id: ReviewId, change: ReviewChange) -> Result<(), IntakeError> {
        match self.store.apply(review_id, change, Utc::now()).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(IntakeError::ReviewNotFound),
            Err(other) => Err(other.into()),
        }
    }
}
