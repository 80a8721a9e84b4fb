//! Bulk import of historical reviews from a JSON array.
//!
//! Records are deduplicated per business by creation timestamp. A record that
//! cannot be parsed is counted and skipped; it never aborts the batch.
//! A replacing import is a single store write: if it fails, the business's
//! previous history is still there.

use chrono::{DateTime, NaiveDateTime, Utc};
use review_intake_models::{ContactInfo, ContactMethod, NewReview, Priority, SentimentLabel, StarRating};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{info, warn};
use crate::store::{ReviewStore, StoreError};
use crate::triage::extract_tags;

/// One entry of the import file, before interpretation
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    pub rating: Value,
    pub feedback: String,
    pub timestamp: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Either an object or a string holding JSON
    #[serde(default)]
    pub contact_info: Option<Value>,
    #[serde(default)]
    pub improvement_feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
    pub with_contact: usize,
    pub with_improvement: usize,
    pub errors: usize,
    pub deleted: usize,
    pub total: usize,
}

/// Import `records` for `business_id`, calling `progress` after each record.
///
/// With `replace`, the business's existing reviews are swapped for the batch.
pub async fn import_reviews(
    store: &dyn ReviewStore,
    business_id: u64,
    records: &[Value],
    replace: bool,
    mut progress: impl FnMut(usize),
) -> Result<ImportStats, StoreError> {
    let mut stats = ImportStats {
        total: records.len(),
        ..ImportStats::default()
    };

    let mut batch = Vec::new();
    let mut batch_times = BTreeSet::new();

    for (index, raw) in records.iter().enumerate() {
        progress(index + 1);

        let (new_review, has_contact) = match interpret(raw, business_id) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!(operation = "import", record = index, reason = %reason, "Skipping malformed record");
                stats.errors += 1;
                continue;
            }
        };

        // Existing rows only count when they are kept
        let duplicate = !batch_times.insert(new_review.created_at)
            || (!replace && store.has_review_at(business_id, new_review.created_at).await?);
        if duplicate {
            stats.skipped += 1;
            continue;
        }

        stats.with_contact += usize::from(has_contact);
        stats.with_improvement += usize::from(new_review.improvement_feedback.is_some());
        if replace {
            batch.push(new_review);
        } else {
            store.create(new_review).await?;
        }
        stats.imported += 1;
    }

    if replace {
        stats.deleted = store.replace_business(business_id, batch).await?;
        info!(operation = "import", business_id, deleted = stats.deleted, "Replaced existing reviews");
    }

    info!(
        operation = "import",
        business_id,
        imported = stats.imported,
        skipped = stats.skipped,
        with_contact = stats.with_contact,
        with_improvement = stats.with_improvement,
        errors = stats.errors,
        total = stats.total,
        "Import completed"
    );
    Ok(stats)
}

fn interpret(raw: &Value, business_id: u64) -> Result<(NewReview, bool), String> {
    let record: ImportRecord = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;

    let rating = record
        .rating
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .and_then(StarRating::new)
        .ok_or_else(|| format!("rating {} is not 1-5", record.rating))?;
    let created_at = parse_timestamp(&record.timestamp)?;
    let sentiment = record
        .sentiment
        .as_deref()
        .and_then(|s| s.parse::<SentimentLabel>().ok())
        .unwrap_or(SentimentLabel::Neutral);
    let contact = record.contact_info.as_ref().and_then(parse_contact);
    let customer_name = contact
        .as_ref()
        .map(|c| c.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());
    let has_contact = contact.is_some();

    let review = NewReview {
        business_id,
        rating,
        tags: extract_tags(rating, &record.feedback),
        text: record.feedback,
        sentiment,
        created_at,
        priority: Priority::from_rating(rating),
        source: Some(record.source.unwrap_or_else(|| "website".to_string())),
        correlation_token: None,
        customer_name: Some(customer_name),
        contact_info: contact,
        improvement_feedback: record.improvement_feedback.filter(|s| !s.trim().is_empty()),
    };
    Ok((review, has_contact))
}

/// RFC 3339, or a naive ISO timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unrecognised timestamp {:?}", raw))
}

fn parse_contact(value: &Value) -> Option<ContactInfo> {
    let object: Map<String, Value> = match value {
        Value::Object(map) => map.clone(),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        },
        _ => return None,
    };
    if object.is_empty() {
        return None;
    }

    let field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(ContactInfo {
        name: field("name").unwrap_or_default(),
        email: field("email"),
        phone: field("phone"),
        preferred_contact: field("preferred_contact")
            .and_then(|m| m.parse::<ContactMethod>().ok())
            .unwrap_or_default(),
    })
}
