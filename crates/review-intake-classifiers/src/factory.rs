//! Builds the configured classifier strategy.
//!
//! Strategy selection happens once, here; the pipeline only ever sees
//! `Arc<dyn SentimentClassifier>`.

use review_intake_config::{ClassifierConfig, ClassifierStrategy, ConfigError, CredentialStore, ExternalClassifierConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::budget::CallBudget;
use crate::heuristic::HeuristicClassifier;
use crate::openai::{ExternalClassifier, OpenAiLabelProvider};
use crate::retry::RetryPolicy;
use crate::traits::{LabelProvider, SentimentClassifier};

pub struct ClassifierFactory;

impl ClassifierFactory {
    /// Fails fast when the external strategy has no API key
    pub fn from_config(
        config: &ClassifierConfig,
        credentials: &CredentialStore,
    ) -> Result<Arc<dyn SentimentClassifier>, ConfigError> {
        match config.strategy {
            ClassifierStrategy::Heuristic => {
                info!(operation = "classifier_selected", strategy = "heuristic", "Using local heuristic classifier");
                Ok(Arc::new(HeuristicClassifier::new()))
            }
            ClassifierStrategy::External => {
                let api_key = credentials.resolve_classifier_api_key()?;
                let external = &config.external;
                let provider = OpenAiLabelProvider::new(
                    external.endpoint.clone(),
                    external.model.clone(),
                    api_key,
                    Duration::from_secs(external.timeout_seconds),
                );
                info!(
                    operation = "classifier_selected",
                    strategy = "external",
                    endpoint = %external.endpoint,
                    model = %external.model,
                    "Using external classifier"
                );
                Ok(Arc::new(Self::external_with_provider(external, provider)))
            }
        }
    }

    /// External strategy around any provider, with budget and retry settings from config
    pub fn external_with_provider<P: LabelProvider>(
        config: &ExternalClassifierConfig,
        provider: P,
    ) -> ExternalClassifier<P> {
        let budget = Arc::new(CallBudget::new(
            config.budget_per_minute,
            Duration::from_secs(config.budget_window_seconds),
            Duration::from_secs(config.budget_wait_seconds),
        ));
        ExternalClassifier::new(
            provider,
            budget,
            RetryPolicy::new(config.max_retries, Duration::from_secs(config.retry_delay_seconds)),
            Duration::from_secs(config.timeout_seconds),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn empty_credentials() -> CredentialStore {
        CredentialStore::new(PathBuf::from("/nonexistent/reviewgate/credentials.toml"))
    }

    #[test]
    fn test_heuristic_needs_no_credentials() {
        let config = ClassifierConfig::default();
        let classifier = ClassifierFactory::from_config(&config, &empty_credentials()).unwrap();
        assert_eq!(classifier.strategy_name(), "heuristic");
    }

    #[test]
    fn test_external_with_stored_key() {
        let config = ClassifierConfig {
            strategy: ClassifierStrategy::External,
            external: ExternalClassifierConfig::default(),
        };
        let mut credentials = empty_credentials();
        credentials.set_classifier_api_key("sk-test".to_string());
        let classifier = ClassifierFactory::from_config(&config, &credentials).unwrap();
        assert_eq!(classifier.strategy_name(), "external");
    }

    #[test]
    fn test_external_without_key_is_a_startup_error() {
        if std::env::var(review_intake_config::API_KEY_ENV_VAR).is_ok() {
            return;
        }
        let config = ClassifierConfig {
            strategy: ClassifierStrategy::External,
            external: ExternalClassifierConfig::default(),
        };
        let result = ClassifierFactory::from_config(&config, &empty_credentials());
        assert!(matches!(result, Err(ConfigError::MissingCredential { .. })));
    }
}
