use async_trait::async_trait;
use chrono::{DateTime, Utc};
use review_intake_models::{ContactInfo, CorrelationToken, NewReview, Review, ReviewId, ReviewResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod file;
pub mod memory;
pub mod snapshot;

pub use file::FileReviewStore;
pub use memory::InMemoryReviewStore;
pub use snapshot::SnapshotStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Review {0} does not exist")]
    NotFound(ReviewId),

    #[error("Review {0} already has a response")]
    DuplicateResponse(ReviewId),

    #[error("Review store unavailable: {0}")]
    Unavailable(String),
}

/// A change to one stored review, applied under the store's write lock so
/// concurrent steps on the same review never overwrite each other.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewChange {
    Improvement { feedback: String, areas: Vec<String> },
    Contact(ContactInfo),
    MarkRead,
}

impl ReviewChange {
    /// Returns false when the review was left as it was
    fn apply_to(self, review: &mut Review, now: DateTime<Utc>) -> bool {
        match self {
            ReviewChange::Improvement { feedback, areas } => {
                review.record_improvement(feedback, areas, now);
                true
            }
            ReviewChange::Contact(contact) => {
                review.record_contact(contact, now);
                true
            }
            ReviewChange::MarkRead => review.mark_read(now),
        }
    }
}

/// Persistence for reviews and their responses.
///
/// Every write is all-or-nothing: when a call returns an error the store is
/// left exactly as it was before the call. Writes to an existing review go
/// through [`ReviewStore::apply`] or [`ReviewStore::create_response`], which
/// read and modify the stored record in one critical section.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    fn backend_name(&self) -> &str;

    /// Insert and assign the next id
    async fn create(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn find_by_id(&self, id: ReviewId) -> Result<Option<Review>, StoreError>;

    async fn find_by_correlation(&self, token: &CorrelationToken) -> Result<Option<Review>, StoreError>;

    /// Apply `change` to the stored review. Ok(false) means nothing changed.
    async fn apply(&self, id: ReviewId, change: ReviewChange, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Newest first
    async fn find_recent_for_business(&self, business_id: u64, limit: usize) -> Result<Vec<Review>, StoreError>;

    async fn has_review_at(&self, business_id: u64, created_at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Swap a business's whole history for `reviews` in one write. Returns how many were deleted.
    async fn replace_business(&self, business_id: u64, reviews: Vec<NewReview>) -> Result<usize, StoreError>;

    /// Store the response and mark the review responded together; a second response is refused
    async fn create_response(&self, response: ReviewResponse) -> Result<(), StoreError>;

    async fn find_response(&self, review_id: ReviewId) -> Result<Option<ReviewResponse>, StoreError>;
}

/// Full store contents, shared by the in-memory and file backends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    next_id: ReviewId,
    reviews: BTreeMap<ReviewId, Review>,
    responses: BTreeMap<ReviewId, ReviewResponse>,
    by_token: BTreeMap<CorrelationToken, ReviewId>,
}

impl StoreSnapshot {
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    fn insert(&mut self, new: NewReview) -> Review {
        self.next_id += 1;
        let review = Review::from_new(self.next_id, new);
        if let Some(token) = &review.correlation_token {
            self.by_token.insert(token.clone(), review.id);
        }
        self.reviews.insert(review.id, review.clone());
        review
    }

    fn get(&self, id: ReviewId) -> Option<Review> {
        self.reviews.get(&id).cloned()
    }

    fn by_correlation(&self, token: &CorrelationToken) -> Option<Review> {
        self.by_token.get(token).and_then(|id| self.get(*id))
    }

    fn apply(&mut self, id: ReviewId, change: ReviewChange, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let review = self.reviews.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        Ok(change.apply_to(review, now))
    }

    fn recent_for_business(&self, business_id: u64, limit: usize) -> Vec<Review> {
        let mut matching: Vec<Review> = self
            .reviews
            .values()
            .filter(|r| r.business_id == business_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit);
        matching
    }

    fn has_review_at(&self, business_id: u64, created_at: DateTime<Utc>) -> bool {
        self.reviews
            .values()
            .any(|r| r.business_id == business_id && r.created_at == created_at)
    }

    fn remove_business(&mut self, business_id: u64) -> usize {
        let doomed: Vec<ReviewId> = self
            .reviews
            .values()
            .filter(|r| r.business_id == business_id)
            .map(|r| r.id)
            .collect();
        for id in &doomed {
            if let Some(token) = self.reviews.remove(id).and_then(|r| r.correlation_token) {
                self.by_token.remove(&token);
            }
            self.responses.remove(id);
        }
        doomed.len()
    }

    fn replace_business(&mut self, business_id: u64, reviews: Vec<NewReview>) -> usize {
        let deleted = self.remove_business(business_id);
        for review in reviews {
            self.insert(review);
        }
        deleted
    }

    fn insert_response(&mut self, response: ReviewResponse) -> Result<(), StoreError> {
        if self.responses.contains_key(&response.review_id) {
            return Err(StoreError::DuplicateResponse(response.review_id));
        }
        let review = self
            .reviews
            .get_mut(&response.review_id)
            .ok_or(StoreError::NotFound(response.review_id))?;
        review.mark_responded(response.created_at);
        self.responses.insert(response.review_id, response);
        Ok(())
    }

    fn response(&self, review_id: ReviewId) -> Option<ReviewResponse> {
        self.responses.get(&review_id).cloned()
    }
}


#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use review_intake_models::{CorrelationToken, NewReview, Priority, SentimentLabel, StarRating};
    use std::collections::BTreeSet;

    pub fn new_review(business_id: u64, rating: u8, created_at: DateTime<Utc>) -> NewReview {
        let rating = StarRating::new(rating).unwrap();
        NewReview {
            business_id,
            rating,
            text: format!("{} star visit", rating),
            sentiment: SentimentLabel::from_rating(rating),
            created_at,
            priority: Priority::from_rating(rating),
            source: Some("website".to_string()),
            tags: BTreeSet::new(),
            correlation_token: Some(CorrelationToken::generate()),
            customer_name: None,
            contact_info: None,
            improvement_feedback: None,
        }
    }

    pub fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }
}
