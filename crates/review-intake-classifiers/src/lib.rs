pub mod traits;
pub mod error;
pub mod retry;
pub mod budget;
pub mod heuristic;
pub mod openai;
pub mod factory;

pub use traits::{Classification, Degradation, LabelProvider, SentimentClassifier};
pub use error::{ClassifierError, FailureKind};
pub use retry::{retry_with_backoff, RetryExhausted, RetryPolicy, RetryableFailure};
pub use budget::CallBudget;
pub use heuristic::HeuristicClassifier;
pub use openai::{ExternalClassifier, OpenAiLabelProvider};
pub use factory::ClassifierFactory;
