//! Input validation for review submissions and the follow-up wizard steps.
//!
//! Pure functions: no state, no I/O. Free text is checked after trimming
//! and length is counted in characters.

use review_intake_models::{ContactInfo, ContactMethod, ContactSubmission, ReviewSubmission, StarRating};
use serde_json::Value;
use thiserror::Error;

pub const MAX_FEEDBACK_CHARS: usize = 1000;

/// Matched case-insensitively anywhere in the text
pub const FORBIDDEN_PATTERNS: [&str; 4] = ["<script>", "javascript:", "onload=", "onerror="];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid rating value")]
    InvalidRating,

    #[error("Invalid feedback length")]
    InvalidLength,

    #[error("Invalid feedback content")]
    InvalidContent,

    #[error("Invalid contact information: {0}")]
    InvalidContact(String),
}

impl ValidationError {
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::InvalidRating => "invalid_rating",
            ValidationError::InvalidLength => "invalid_length",
            ValidationError::InvalidContent => "invalid_content",
            ValidationError::InvalidContact(_) => "invalid_contact",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub rating: StarRating,
    pub feedback: String,
}

/// Validate a raw rating and feedback pair.
///
/// The rating must be an integral JSON number from 1 to 5; strings, booleans
/// and fractional numbers are rejected. Feedback must be 1..=1000 characters
/// after trimming and free of forbidden markup.
pub fn validate(rating: &Value, feedback: &str) -> Result<ValidatedSubmission, ValidationError> {
    let rating = parse_rating(rating).ok_or(ValidationError::InvalidRating)?;

    let trimmed = feedback.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > MAX_FEEDBACK_CHARS {
        return Err(ValidationError::InvalidLength);
    }
    if contains_forbidden(trimmed) {
        return Err(ValidationError::InvalidContent);
    }

    Ok(ValidatedSubmission {
        rating,
        feedback: trimmed.to_string(),
    })
}

pub fn validate_submission(submission: &ReviewSubmission) -> Result<ValidatedSubmission, ValidationError> {
    validate(&submission.rating, &submission.feedback)
}

/// Screen optional free text such as improvement feedback. Empty is allowed.
pub fn screen_free_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX_FEEDBACK_CHARS {
        return Err(ValidationError::InvalidLength);
    }
    if contains_forbidden(trimmed) {
        return Err(ValidationError::InvalidContent);
    }
    Ok(trimmed.to_string())
}

/// Validate the contact step for a customer who agreed to be contacted
pub fn validate_contact(submission: &ContactSubmission) -> Result<ContactInfo, ValidationError> {
    let name = screen_field(&submission.name, "name")?;
    let email = screen_field(&submission.email, "email")?;
    let phone = screen_field(&submission.phone, "phone")?;

    if name.is_empty() {
        return Err(ValidationError::InvalidContact("name is required".to_string()));
    }
    if email.is_empty() && phone.is_empty() {
        return Err(ValidationError::InvalidContact(
            "an email address or phone number is required".to_string(),
        ));
    }
    if !email.is_empty() && !looks_like_email(&email) {
        return Err(ValidationError::InvalidContact("email address is malformed".to_string()));
    }
    match submission.preferred_contact {
        ContactMethod::Email if email.is_empty() => {
            return Err(ValidationError::InvalidContact(
                "email preferred but no email address given".to_string(),
            ))
        }
        ContactMethod::Phone if phone.is_empty() => {
            return Err(ValidationError::InvalidContact(
                "phone preferred but no phone number given".to_string(),
            ))
        }
        _ => {}
    }

    Ok(ContactInfo {
        name,
        email: (!email.is_empty()).then_some(email),
        phone: (!phone.is_empty()).then_some(phone),
        preferred_contact: submission.preferred_contact,
    })
}

fn parse_rating(value: &Value) -> Option<StarRating> {
    let raw = value.as_u64()?;
    let raw = u8::try_from(raw).ok()?;
    StarRating::new(raw)
}

fn contains_forbidden(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FORBIDDEN_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

fn screen_field(value: &str, field: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > 200 || contains_forbidden(trimmed) {
        return Err(ValidationError::InvalidContact(format!("{} is not acceptable", field)));
    }
    Ok(trimmed.to_string())
}

// local@domain.tld, nothing stricter
fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
