use review_intake_models::{RedirectTarget, SentimentLabel, StarRating};

/// Where a freshly classified submission goes next.
///
/// Only a high rating with positive sentiment reaches the public share page.
/// Everything else, including four or five stars with neutral or negative
/// text, goes to private feedback.
pub fn route_submission(rating: StarRating, sentiment: SentimentLabel) -> RedirectTarget {
    if rating.is_high() && sentiment == SentimentLabel::Positive {
        RedirectTarget::Share
    } else {
        RedirectTarget::Feedback
    }
}

pub fn route_after_feedback_detail() -> RedirectTarget {
    RedirectTarget::FeedbackContact
}

pub fn route_after_contact(wants_contact: bool) -> RedirectTarget {
    if wants_contact {
        RedirectTarget::ThankYou
    } else {
        RedirectTarget::Goodbye
    }
}

/// Original text is handed to the feedback step so the customer can expand on it
pub fn carries_feedback(target: RedirectTarget) -> bool {
    target == RedirectTarget::Feedback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stars(v: u8) -> StarRating {
        StarRating::new(v).unwrap()
    }

    #[test]
    fn test_high_rating_positive_shares() {
        assert_eq!(route_submission(stars(5), SentimentLabel::Positive), RedirectTarget::Share);
        assert_eq!(route_submission(stars(4), SentimentLabel::Positive), RedirectTarget::Share);
    }

    #[test]
    fn test_high_rating_without_positive_text_goes_private() {
        assert_eq!(route_submission(stars(5), SentimentLabel::Negative), RedirectTarget::Feedback);
        assert_eq!(route_submission(stars(4), SentimentLabel::Neutral), RedirectTarget::Feedback);
    }

    #[test]
    fn test_low_and_middle_ratings_go_private() {
        assert_eq!(route_submission(stars(3), SentimentLabel::Positive), RedirectTarget::Feedback);
        assert_eq!(route_submission(stars(1), SentimentLabel::Negative), RedirectTarget::Feedback);
        assert_eq!(route_submission(stars(2), SentimentLabel::Positive), RedirectTarget::Feedback);
        assert_eq!(route_submission(stars(3), SentimentLabel::Neutral), RedirectTarget::Feedback);
    }

    #[test]
    fn test_contact_step() {
        assert_eq!(route_after_contact(true), RedirectTarget::ThankYou);
        assert_eq!(route_after_contact(false), RedirectTarget::Goodbye);
        assert!(carries_feedback(RedirectTarget::Feedback));
        assert!(!carries_feedback(RedirectTarget::Share));
    }
}
