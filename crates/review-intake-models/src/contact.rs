use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    #[default]
    Email,
    Phone,
}

impl FromStr for ContactMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(ContactMethod::Email),
            "phone" => Ok(ContactMethod::Phone),
            other => Err(format!("unknown contact method: {}", other)),
        }
    }
}

impl fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactMethod::Email => f.write_str("email"),
            ContactMethod::Phone => f.write_str("phone"),
        }
    }
}

/// Contact block persisted on a review once the customer agrees to be contacted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferred_contact: ContactMethod,
}

/// Raw contact-capture step payload, not yet validated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContactSubmission {
    pub wants_contact: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub preferred_contact: ContactMethod,
}

impl ContactSubmission {
    pub fn declined() -> Self {
        Self::default()
    }
}
