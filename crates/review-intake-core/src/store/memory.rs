use async_trait::async_trait;
use chrono::{DateTime, Utc};
use review_intake_models::{CorrelationToken, NewReview, Review, ReviewId, ReviewResponse};
use tokio::sync::RwLock;
use super::{ReviewChange, ReviewStore, StoreError, StoreSnapshot};

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    state: RwLock<StoreSnapshot>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn create(&self, review: NewReview) -> Result<Review, StoreError> {
        Ok(self.state.write().await.insert(review))
    }

    async fn find_by_id(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self.state.read().await.get(id))
    }

    async fn find_by_correlation(&self, token: &CorrelationToken) -> Result<Option<Review>, StoreError> {
        Ok(self.state.read().await.by_correlation(token))
    }

    async fn apply(&self, id: ReviewId, change: ReviewChange, now: DateTime<Utc>) -> Result<bool, StoreError> {
        self.state.write().await.apply(id, change, now)
    }

    async fn find_recent_for_business(&self, business_id: u64, limit: usize) -> Result<Vec<Review>, StoreError> {
        Ok(self.state.read().await.recent_for_business(business_id, limit))
    }

    async fn has_review_at(&self, business_id: u64, created_at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self.state.read().await.has_review_at(business_id, created_at))
    }

    async fn replace_business(&self, business_id: u64, reviews: Vec<NewReview>) -> Result<usize, StoreError> {
        Ok(self.state.write().await.replace_business(business_id, reviews))
    }

    async fn create_response(&self, response: ReviewResponse) -> Result<(), StoreError> {
        self.state.write().await.insert_response(response)
    }

    async fn find_response(&self, review_id: ReviewId) -> Result<Option<ReviewResponse>, StoreError> {
        Ok(self.state.read().await.response(review_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, new_review};
    use review_intake_models::{ContactInfo, ContactMethod, ReviewStatus};

    #[tokio::test]
    async fn test_ids_are_sequential_and_lookups_work() {
        let store = InMemoryReviewStore::new();
        let first = store.create(new_review(1, 5, at(0))).await.unwrap();
        let second = store.create(new_review(1, 2, at(10))).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let token = second.correlation_token.clone().unwrap();
        let found = store.find_by_correlation(&token).await.unwrap().unwrap();
        assert_eq!(found.id, 2);
        assert!(store.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_scoped() {
        let store = InMemoryReviewStore::new();
        store.create(new_review(1, 5, at(0))).await.unwrap();
        store.create(new_review(2, 4, at(5))).await.unwrap();
        store.create(new_review(1, 3, at(10))).await.unwrap();

        let recent = store.find_recent_for_business(1, 10).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(store.find_recent_for_business(1, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_response_is_refused() {
        let store = InMemoryReviewStore::new();
        let review = store.create(new_review(1, 2, at(0))).await.unwrap();
        let response = ReviewResponse {
            review_id: review.id,
            responder_id: 9,
            text: "Sorry about that".to_string(),
            created_at: at(60),
        };

        store.create_response(response.clone()).await.unwrap();
        let err = store.create_response(response).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateResponse(1)));

        let stored = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.status, ReviewStatus::Responded);
        assert_eq!(stored.last_updated, at(60));
    }

    #[tokio::test]
    async fn test_changes_to_unknown_review_fail() {
        let store = InMemoryReviewStore::new();
        let change = ReviewChange::Improvement { feedback: "Faster".to_string(), areas: Vec::new() };
        assert!(matches!(store.apply(42, change, at(0)).await, Err(StoreError::NotFound(42))));

        let response = ReviewResponse {
            review_id: 42,
            responder_id: 1,
            text: "Thanks".to_string(),
            created_at: at(0),
        };
        assert!(matches!(store.create_response(response).await, Err(StoreError::NotFound(42))));
        assert!(store.find_response(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_response_and_contact_both_survive() {
        let store = InMemoryReviewStore::new();
        let review = store.create(new_review(1, 2, at(0))).await.unwrap();
        let contact = ContactInfo {
            name: "Dana".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            preferred_contact: ContactMethod::Email,
        };

        store.apply(review.id, ReviewChange::Contact(contact.clone()), at(10)).await.unwrap();
        store
            .create_response(ReviewResponse {
                review_id: review.id,
                responder_id: 3,
                text: "We will call".to_string(),
                created_at: at(20),
            })
            .await
            .unwrap();

        let stored = store.find_by_id(review.id).await.unwrap().unwrap();
        assert_eq!(stored.contact_info, Some(contact));
        assert_eq!(stored.status, ReviewStatus::Responded);
    }

    #[tokio::test]
    async fn test_replace_business_leaves_others_alone() {
        let store = InMemoryReviewStore::new();
        store.create(new_review(1, 5, at(0))).await.unwrap();
        store.create(new_review(2, 5, at(0))).await.unwrap();
        let deleted = store.replace_business(1, vec![new_review(1, 3, at(30))]).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.len().await, 2);
        assert!(store.has_review_at(2, at(0)).await.unwrap());
        assert!(!store.has_review_at(1, at(0)).await.unwrap());
        assert!(store.has_review_at(1, at(30)).await.unwrap());
    }
}
