pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;

pub use config::{BusinessConfig, ClassifierConfig, ClassifierStrategy, Config, ExternalClassifierConfig, RateLimitConfig, StoreBackend, StoreConfig};
pub use credentials::{CredentialStore, API_KEY_ENV_VAR};
pub use error::ConfigError;
pub use paths::{PathManager, container_base_path};
