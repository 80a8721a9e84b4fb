use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the customer is sent next in the review wizard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    /// Public review-sharing page (happy path)
    Share,
    /// Internal feedback-detail form
    Feedback,
    /// Contact-capture form that follows feedback detail
    FeedbackContact,
    ThankYou,
    Goodbye,
}

impl RedirectTarget {
    pub fn path(&self) -> &'static str {
        match self {
            RedirectTarget::Share => "/share",
            RedirectTarget::Feedback => "/feedback",
            RedirectTarget::FeedbackContact => "/feedback/contact",
            RedirectTarget::ThankYou => "/thank-you",
            RedirectTarget::Goodbye => "/goodbye",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectTarget::Share => "share",
            RedirectTarget::Feedback => "feedback",
            RedirectTarget::FeedbackContact => "feedback_contact",
            RedirectTarget::ThankYou => "thank_you",
            RedirectTarget::Goodbye => "goodbye",
        }
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
