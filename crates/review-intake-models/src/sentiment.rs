use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::rating::StarRating;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    /// Rating-only mapping: 4-5 positive, 1-2 negative, 3 neutral.
    /// Used as the heuristic base label and as the degraded-mode fallback.
    pub fn from_rating(rating: StarRating) -> Self {
        if rating.is_high() {
            SentimentLabel::Positive
        } else if rating.is_low() {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            other => Err(format!("unknown sentiment label: {}", other)),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: u8) -> StarRating {
        StarRating::new(value).unwrap()
    }

    #[test]
    fn test_from_rating_thresholds() {
        assert_eq!(SentimentLabel::from_rating(rating(5)), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_rating(rating(4)), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_rating(rating(3)), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_rating(rating(2)), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_rating(rating(1)), SentimentLabel::Negative);
    }

    #[test]
    fn test_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(" Positive\n".parse::<SentimentLabel>(), Ok(SentimentLabel::Positive));
        assert_eq!("NEGATIVE".parse::<SentimentLabel>(), Ok(SentimentLabel::Negative));
        assert!("pos".parse::<SentimentLabel>().is_err());
    }
}
