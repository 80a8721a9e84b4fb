pub mod contact;
pub mod rating;
pub mod redirect;
pub mod review;
pub mod sentiment;
pub mod session;
pub mod submission;

pub use contact::{ContactInfo, ContactMethod, ContactSubmission};
pub use rating::StarRating;
pub use redirect::RedirectTarget;
pub use review::{NewReview, Priority, Review, ReviewId, ReviewResponse, ReviewStatus};
pub use sentiment::SentimentLabel;
pub use session::CorrelationToken;
pub use submission::ReviewSubmission;
