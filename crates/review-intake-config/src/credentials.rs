use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::error::ConfigError;

/// Environment variable that takes precedence over the stored API key
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

const API_KEY: &str = "classifier_api_key";
const API_KEY_SAVED_AT: &str = "classifier_api_key_saved_at";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_classifier_api_key(&self) -> Option<&String> {
        self.get(API_KEY).filter(|key| !key.trim().is_empty())
    }

    pub fn set_classifier_api_key(&mut self, key: String) {
        self.set(API_KEY.to_string(), key);
        self.set(API_KEY_SAVED_AT.to_string(), Utc::now().to_rfc3339());
    }

    pub fn get_classifier_api_key_saved_at(&self) -> Option<DateTime<Utc>> {
        self.get(API_KEY_SAVED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Environment first, then the stored credential
    pub fn resolve_classifier_api_key(&self) -> Result<String, ConfigError> {
        let from_env = std::env::var(API_KEY_ENV_VAR).ok().filter(|key| !key.trim().is_empty());
        from_env
            .or_else(|| self.get_classifier_api_key().cloned())
            .ok_or_else(|| ConfigError::MissingCredential {
                name: API_KEY.to_string(),
                hint: format!(
                    "set {} or run 'reviewgate config set-api-key' before using the external classifier",
                    API_KEY_ENV_VAR
                ),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_classifier_api_key("sk-test".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_classifier_api_key(), Some(&"sk-test".to_string()));
        let saved_at = loaded_store.get_classifier_api_key_saved_at().unwrap();
        assert!((Utc::now() - saved_at).num_seconds().abs() < 5);
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/reviewgate-test-credentials"));
        store.set(API_KEY.to_string(), "   ".to_string());
        assert_eq!(store.get_classifier_api_key(), None);
    }

    #[test]
    fn test_credential_store_remove() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/reviewgate-test-credentials"));
        store.set("key1".to_string(), "value1".to_string());
        store.set("key2".to_string(), "value2".to_string());

        store.remove("key1");
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), Some(&"value2".to_string()));
        assert!(!store.is_empty());
    }
}
