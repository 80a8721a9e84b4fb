use review_intake_models::{SentimentLabel, StarRating};
use std::collections::BTreeSet;

const KEYWORD_TAGS: &[(&str, &[&str])] = &[
    ("service", &["service"]),
    ("quality", &["quality"]),
    ("pricing", &["price", "expensive", "cost"]),
    ("timing", &["wait", "time"]),
];

/// Tags for the triage queue: the rating band plus topic keywords found in the text
pub fn extract_tags(rating: StarRating, text: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    tags.insert(SentimentLabel::from_rating(rating).as_str().to_string());

    let lowered = text.to_lowercase();
    for (tag, keywords) in KEYWORD_TAGS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            tags.insert(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_band_and_keywords() {
        let tags = extract_tags(StarRating::new(2).unwrap(), "Long WAIT and too expensive");
        let tags: Vec<_> = tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["negative", "pricing", "timing"]);
    }

    #[test]
    fn test_no_keywords() {
        let tags = extract_tags(StarRating::new(3).unwrap(), "ok");
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("neutral"));
    }
}
