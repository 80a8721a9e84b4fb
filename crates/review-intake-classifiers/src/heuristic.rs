use async_trait::async_trait;
use review_intake_models::{SentimentLabel, StarRating};
use crate::error::ClassifierError;
use crate::traits::{Classification, SentimentClassifier};

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "careless", "dirty", "disappointed", "disappointing", "hate", "hated",
    "horrible", "incompetent", "mediocre", "overpriced", "painful", "poor", "rude",
    "terrible", "unfriendly", "unhappy", "unprofessional", "worst",
];

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "best", "clean", "comfortable", "excellent", "fantastic",
    "friendly", "gentle", "good", "great", "happy", "helpful", "kind", "love", "loved",
    "perfect", "professional", "recommend", "satisfied", "thorough", "wonderful",
];

/// A lexicon needs this many more opposing hits than supporting hits to flip the base label
const FLIP_MARGIN: usize = 2;

/// Local strategy: rating-derived base label, adjusted by word counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Pure and deterministic
    pub fn label(rating: StarRating, feedback: &str) -> SentimentLabel {
        let base = SentimentLabel::from_rating(rating);
        let (positive, negative) = lexicon_counts(feedback);

        match base {
            SentimentLabel::Positive if negative > positive + FLIP_MARGIN => SentimentLabel::Negative,
            SentimentLabel::Negative if positive > negative + FLIP_MARGIN => SentimentLabel::Positive,
            other => other,
        }
    }
}

/// (positive hits, negative hits), counting every occurrence of a lexicon word
fn lexicon_counts(feedback: &str) -> (usize, usize) {
    let lowered = feedback.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .fold((0, 0), |(pos, neg), word| {
            if POSITIVE_WORDS.contains(&word) {
                (pos + 1, neg)
            } else if NEGATIVE_WORDS.contains(&word) {
                (pos, neg + 1)
            } else {
                (pos, neg)
            }
        })
}

#[async_trait]
impl SentimentClassifier for HeuristicClassifier {
    fn strategy_name(&self) -> &str {
        "heuristic"
    }

    async fn classify(&self, rating: StarRating, feedback: &str) -> Result<Classification, ClassifierError> {
        Ok(Classification::local(Self::label(rating, feedback)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: u8) -> StarRating {
        StarRating::new(value).unwrap()
    }

    #[test]
    fn test_lexicon_counts_are_case_insensitive() {
        assert_eq!(lexicon_counts("TERRIBLE, terrible! Great."), (1, 2));
        assert_eq!(lexicon_counts(""), (0, 0));
    }

    #[test]
    fn test_positive_base_flips_on_strong_negative_text() {
        let label = HeuristicClassifier::label(rating(5), "terrible terrible terrible bad poor");
        assert_eq!(label, SentimentLabel::Negative);
    }

    #[test]
    fn test_positive_base_holds_within_margin() {
        // 2 negative vs 0 positive is not more than 0 + 2
        let label = HeuristicClassifier::label(rating(4), "bad parking, rude receptionist");
        assert_eq!(label, SentimentLabel::Positive);
    }

    #[test]
    fn test_negative_base_flips_on_strong_positive_text() {
        let label = HeuristicClassifier::label(
            rating(1),
            "Great staff, friendly and professional, excellent care",
        );
        assert_eq!(label, SentimentLabel::Positive);
    }

    #[test]
    fn test_neutral_base_never_flips() {
        let label = HeuristicClassifier::label(rating(3), "terrible awful horrible worst bad poor");
        assert_eq!(label, SentimentLabel::Neutral);
        let label = HeuristicClassifier::label(rating(3), "great great great great amazing");
        assert_eq!(label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_is_deterministic() {
        let text = "Friendly team but the wait was terrible";
        let first = HeuristicClassifier::label(rating(2), text);
        for _ in 0..10 {
            assert_eq!(HeuristicClassifier::label(rating(2), text), first);
        }
    }

    #[tokio::test]
    async fn test_classify_never_degrades() {
        let classifier = HeuristicClassifier::new();
        let result = classifier.classify(rating(5), "Best dental experience").await.unwrap();
        assert_eq!(result, Classification::local(SentimentLabel::Positive));
        assert_eq!(classifier.strategy_name(), "heuristic");
    }
}
