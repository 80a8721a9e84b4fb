use async_trait::async_trait;
use chrono::{DateTime, Utc};
use review_intake_models::{CorrelationToken, NewReview, Review, ReviewId, ReviewResponse};
use std::path::Path;
use tokio::sync::Mutex;
use super::{ReviewChange, ReviewStore, SnapshotStorage, StoreError, StoreSnapshot};

/// Store backed by a single snapshot file.
///
/// Writes apply to a copy of the state, persist it, and only then replace the
/// in-memory state. A failed save leaves both memory and disk unchanged.
pub struct FileReviewStore {
    state: Mutex<StoreSnapshot>,
    storage: SnapshotStorage,
}

impl FileReviewStore {
    pub fn open(path: &Path, use_compression: bool) -> anyhow::Result<Self> {
        let storage = SnapshotStorage::new(path, use_compression);
        let state = storage.load()?;
        Ok(Self {
            state: Mutex::new(state),
            storage,
        })
    }

    pub fn storage(&self) -> &SnapshotStorage {
        &self.storage
    }

    async fn commit<T>(
        &self,
        apply: impl FnOnce(&mut StoreSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let out = apply(&mut next)?;
        self.storage
            .save(&next)
            .map_err(|e| StoreError::Unavailable(format!("{:#}", e)))?;
        *state = next;
        Ok(out)
    }
}

#[async_trait]
impl ReviewStore for FileReviewStore {
    fn backend_name(&self) -> &str {
        "file"
    }

    async fn create(&self, review: NewReview) -> Result<Review, StoreError> {
        self.commit(|s| Ok(s.insert(review))).await
    }

    async fn find_by_id(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self.state.lock().await.get(id))
    }

    async fn find_by_correlation(&self, token: &CorrelationToken) -> Result<Option<Review>, StoreError> {
        Ok(self.state.lock().await.by_correlation(token))
    }

    async fn apply(&self, id: ReviewId, change: ReviewChange, now: DateTime<Utc>) -> Result<bool, StoreError> {
        self.commit(|s| s.apply(id, change, now)).await
    }

    async fn find_recent_for_business(&self, business_id: u64, limit: usize) -> Result<Vec<Review>, StoreError> {
        Ok(self.state.lock().await.recent_for_business(business_id, limit))
    }

    async fn has_review_at(&self, business_id: u64, created_at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.has_review_at(business_id, created_at))
    }

    async fn replace_business(&self, business_id: u64, reviews: Vec<NewReview>) -> Result<usize, StoreError> {
        self.commit(|s| Ok(s.replace_business(business_id, reviews))).await
    }

    async fn create_response(&self, response: ReviewResponse) -> Result<(), StoreError> {
        self.commit(|s| s.insert_response(response)).await
    }

    async fn find_response(&self, review_id: ReviewId) -> Result<Option<ReviewResponse>, StoreError> {
        Ok(self.state.lock().await.response(review_id))
    }
}
