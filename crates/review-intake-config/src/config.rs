use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub business: BusinessConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Per-client sliding-window admission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests_per_window")]
    pub max_requests_per_window: usize,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    External,
    #[default]
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub strategy: ClassifierStrategy,
    #[serde(default)]
    pub external: ExternalClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalClassifierConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    // Process-wide upstream call budget, separate from the client rate limit
    #[serde(default = "default_budget_per_minute")]
    pub budget_per_minute: usize,
    #[serde(default = "default_window_seconds")]
    pub budget_window_seconds: u64,
    #[serde(default = "default_budget_wait_seconds")]
    pub budget_wait_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    #[serde(default = "default_business_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub path: Option<PathBuf>, // Defaults to data/reviews.bin
    #[serde(default = "default_true")]
    pub compress: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_requests_per_window() -> usize {
    5
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    300 // 5 minutes
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_budget_per_minute() -> usize {
    50
}

fn default_budget_wait_seconds() -> u64 {
    5
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    2
}

fn default_business_id() -> u64 {
    1
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: default_max_requests_per_window(),
            window_seconds: default_window_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl Default for ExternalClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            budget_per_minute: default_budget_per_minute(),
            budget_window_seconds: default_window_seconds(),
            budget_wait_seconds: default_budget_wait_seconds(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay_seconds(),
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            id: default_business_id(),
            name: String::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            compress: default_true(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing file means defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: u64| {
            if value == 0 {
                Err(ConfigError::InvalidValue { field, reason: "must be greater than zero".to_string() })
            } else {
                Ok(())
            }
        };

        positive("rate_limit.max_requests_per_window", self.rate_limit.max_requests_per_window as u64)?;
        positive("rate_limit.window_seconds", self.rate_limit.window_seconds)?;
        positive("rate_limit.cleanup_interval_seconds", self.rate_limit.cleanup_interval_seconds)?;

        if self.classifier.strategy == ClassifierStrategy::External {
            let external = &self.classifier.external;
            positive("classifier.external.budget_per_minute", external.budget_per_minute as u64)?;
            positive("classifier.external.budget_window_seconds", external.budget_window_seconds)?;
            positive("classifier.external.timeout_seconds", external.timeout_seconds)?;
            positive("classifier.external.max_retries", external.max_retries as u64)?;
            if !external.endpoint.starts_with("http://") && !external.endpoint.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: "classifier.external.endpoint",
                    reason: format!("'{}' is not an http(s) URL", external.endpoint),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.max_requests_per_window, 5);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.rate_limit.cleanup_interval_seconds, 300);
        assert_eq!(config.classifier.strategy, ClassifierStrategy::Heuristic);
        assert_eq!(config.classifier.external.budget_per_minute, 50);
        assert_eq!(config.classifier.external.timeout_seconds, 10);
        assert_eq!(config.classifier.external.max_retries, 3);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [rate_limit]
            max_requests_per_window = 10

            [classifier]
            strategy = "external"

            [classifier.external]
            timeout_seconds = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.max_requests_per_window, 10);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.classifier.strategy, ClassifierStrategy::External);
        assert_eq!(config.classifier.external.timeout_seconds, 3);
        assert_eq!(config.classifier.external.budget_wait_seconds, 5);
    }

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut config = Config::default();
        config.business.name = "Keem Smile Dentistry".to_string();
        config.classifier.strategy = ClassifierStrategy::External;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.business.name, "Keem Smile Dentistry");
        assert_eq!(loaded.classifier.strategy, ClassifierStrategy::External);
    }

    #[test]
    fn test_config_validate_rejects_zero() {
        let mut config = Config::default();
        config.rate_limit.window_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "rate_limit.window_seconds", .. })
        ));
    }

    #[test]
    fn test_external_settings_only_checked_when_selected() {
        let mut config = Config::default();
        config.classifier.external.endpoint = "ftp://nowhere".to_string();
        assert!(config.validate().is_ok());

        config.classifier.strategy = ClassifierStrategy::External;
        assert!(config.validate().is_err());
    }
}
