use thiserror::Error;

/// Fatal configuration problems, reported at startup rather than per request
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential '{name}': {hint}")]
    MissingCredential { name: String, hint: String },

    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
