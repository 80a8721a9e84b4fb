pub mod clock;
pub mod error;
pub mod import;
pub mod pipeline;
pub mod rate_limiter;
pub mod routing;
pub mod store;
pub mod triage;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{IntakeError, RateLimitScope};
pub use import::{import_reviews, ImportRecord, ImportStats};
pub use pipeline::{IntakeStage, ReviewPipeline, ReviewRef, StepOutcome, SubmissionOutcome};
pub use rate_limiter::{CompactionStats, RateLimiter};
pub use routing::{route_after_contact, route_submission};
pub use store::{FileReviewStore, InMemoryReviewStore, ReviewChange, ReviewStore, StoreError};
pub use triage::extract_tags;
pub use validator::{validate, validate_contact, screen_free_text, ValidatedSubmission, ValidationError};
