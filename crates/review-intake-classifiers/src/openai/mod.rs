pub mod api;
pub mod client;

pub use api::OpenAiLabelProvider;
pub use client::ExternalClassifier;
