use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use crate::contact::ContactInfo;
use crate::rating::StarRating;
use crate::sentiment::SentimentLabel;
use crate::session::CorrelationToken;

pub type ReviewId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    New,
    Read,
    Responded,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::New => "new",
            ReviewStatus::Read => "read",
            ReviewStatus::Responded => "responded",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Triage urgency, ordered from least to most urgent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// 1 star is urgent, 2 stars high, 3 normal, 4-5 low
    pub fn from_rating(rating: StarRating) -> Self {
        match rating.value() {
            1 => Priority::Urgent,
            2 => Priority::High,
            3 => Priority::Normal,
            _ => Priority::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review fields known at creation time; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub business_id: u64,
    pub rating: StarRating,
    pub text: String,
    pub sentiment: SentimentLabel,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    pub source: Option<String>,
    pub tags: BTreeSet<String>,
    pub correlation_token: Option<CorrelationToken>,
    pub customer_name: Option<String>,
    pub contact_info: Option<ContactInfo>,
    pub improvement_feedback: Option<String>,
}

// No skip_serializing_if here: reviews are persisted with bincode, which needs every field present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub business_id: u64,
    pub rating: StarRating,
    pub text: String,
    pub sentiment: SentimentLabel,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub status: ReviewStatus,
    pub priority: Priority,
    pub source: Option<String>, // Origin channel, "website" for intake
    pub tags: BTreeSet<String>,
    pub contact_info: Option<ContactInfo>,
    pub improvement_feedback: Option<String>,
    pub improvement_areas: Vec<String>,
    pub customer_name: Option<String>,
    pub correlation_token: Option<CorrelationToken>, // Wizard session that created the review
}

impl Review {
    pub fn from_new(id: ReviewId, new: NewReview) -> Self {
        Self {
            id,
            business_id: new.business_id,
            rating: new.rating,
            text: new.text,
            sentiment: new.sentiment,
            created_at: new.created_at,
            last_updated: new.created_at,
            status: ReviewStatus::New,
            priority: new.priority,
            source: new.source,
            tags: new.tags,
            contact_info: new.contact_info,
            improvement_feedback: new.improvement_feedback,
            improvement_areas: Vec::new(),
            customer_name: new.customer_name,
            correlation_token: new.correlation_token,
        }
    }

    pub fn record_improvement(&mut self, feedback: String, areas: Vec<String>, now: DateTime<Utc>) {
        self.improvement_feedback = Some(feedback);
        self.improvement_areas = areas;
        self.last_updated = now;
    }

    pub fn record_contact(&mut self, contact: ContactInfo, now: DateTime<Utc>) {
        if !contact.name.is_empty() {
            self.customer_name = Some(contact.name.clone());
        }
        self.contact_info = Some(contact);
        self.last_updated = now;
    }

    /// new -> read; read and responded reviews are left alone
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ReviewStatus::New {
            return false;
        }
        self.status = ReviewStatus::Read;
        self.last_updated = now;
        true
    }

    pub fn mark_responded(&mut self, now: DateTime<Utc>) {
        self.status = ReviewStatus::Responded;
        self.last_updated = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewResponse {
    pub review_id: ReviewId,
    pub responder_id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
