use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use review_intake_classifiers::ClassifierFactory;
use review_intake_config::{Config, CredentialStore, PathManager, StoreBackend, StoreConfig};
use review_intake_core::{
    FileReviewStore, InMemoryReviewStore, IntakeError, RateLimiter, ReviewPipeline, ReviewStore, StepOutcome,
    SubmissionOutcome,
};
use review_intake_models::{Review, ReviewResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub mod clear;
pub mod config;
pub mod import;
pub mod intake;
pub mod prompts;
pub mod respond;
pub mod reviews;
pub mod serve;
pub mod wizard;

/// Everything a command needs, built from the config and credentials files
pub struct AppContext {
    pub config: Config,
    pub pipeline: Arc<ReviewPipeline>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config.validate().wrap_err("Invalid configuration")?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

        let classifier = ClassifierFactory::from_config(&config.classifier, &credentials)
            .wrap_err("Classifier is not usable")?;
        let store = open_store(&config.store, &paths)?;
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let pipeline = Arc::new(ReviewPipeline::new(limiter, classifier, store, config.business.id));

        Ok(Self { config, pipeline })
    }
}

pub fn open_store(config: &StoreConfig, paths: &PathManager) -> Result<Arc<dyn ReviewStore>> {
    match config.backend {
        StoreBackend::Memory => {
            debug!("Using in-memory review store");
            Ok(Arc::new(InMemoryReviewStore::new()))
        }
        StoreBackend::File => {
            paths
                .ensure_directories()
                .map_err(|e| eyre!("Failed to create data directories: {}", e))?;
            let path = config.path.clone().unwrap_or_else(|| paths.review_store_file());
            let store = FileReviewStore::open(&path, config.compress)
                .map_err(|e| eyre!("Failed to open review store {}: {}", path.display(), e))?;
            debug!(path = %path.display(), "Using file review store");
            Ok(Arc::new(store))
        }
    }
}

pub fn submission_json(outcome: &SubmissionOutcome) -> Value {
    json!({
        "redirect": outcome.redirect.as_str(),
        "path": outcome.redirect.path(),
        "review_id": outcome.review_ref.as_ref().map(|r| r.id),
        "token": outcome.review_ref.as_ref().map(|r| r.token.as_str()),
        "sentiment": outcome.sentiment.as_str(),
        "degraded": outcome.degraded,
        "feedback": outcome.carried_feedback,
    })
}

pub fn step_json(outcome: &StepOutcome) -> Value {
    json!({
        "redirect": outcome.redirect.as_str(),
        "path": outcome.redirect.path(),
    })
}

pub fn response_json(response: &ReviewResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}

/// Admin listing view; the wizard session token stays private to its customer
pub fn review_json(review: &Review) -> Value {
    let mut value = serde_json::to_value(review).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("correlation_token");
    }
    value
}

pub fn error_json(error: &IntakeError) -> Value {
    json!({
        "error": error.reason(),
        "status": error.status_code(),
        "message": error.to_string(),
    })
}
