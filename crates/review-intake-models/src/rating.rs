use serde::{Deserialize, Serialize};
use std::fmt;

/// A star rating that has already been checked to lie in 1..=5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct StarRating(u8);

impl StarRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// 4 and 5 stars
    pub fn is_high(self) -> bool {
        self.0 >= 4
    }

    /// 1 and 2 stars
    pub fn is_low(self) -> bool {
        self.0 <= 2
    }
}

impl TryFrom<u8> for StarRating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StarRating::new(value).ok_or_else(|| format!("rating {} is outside 1-5", value))
    }
}

impl From<StarRating> for u8 {
    fn from(rating: StarRating) -> Self {
        rating.0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_rating_bounds() {
        assert!(StarRating::new(0).is_none());
        assert!(StarRating::new(6).is_none());
        assert_eq!(StarRating::new(1).unwrap().value(), 1);
        assert_eq!(StarRating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn test_star_rating_bands() {
        assert!(StarRating::new(4).unwrap().is_high());
        assert!(!StarRating::new(3).unwrap().is_high());
        assert!(!StarRating::new(3).unwrap().is_low());
        assert!(StarRating::new(2).unwrap().is_low());
    }

    #[test]
    fn test_star_rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<StarRating>("7").is_err());
        assert_eq!(serde_json::from_str::<StarRating>("3").unwrap().value(), 3);
    }
}
