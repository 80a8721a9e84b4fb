use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untrusted review payload exactly as received.
///
/// `rating` stays a raw JSON value so that strings, floats and booleans can be
/// rejected by the validator instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewSubmission {
    #[serde(default)]
    pub rating: Value,
    #[serde(default)]
    pub feedback: String,
}

impl ReviewSubmission {
    pub fn new(rating: impl Into<Value>, feedback: impl Into<String>) -> Self {
        Self {
            rating: rating.into(),
            feedback: feedback.into(),
        }
    }
}
