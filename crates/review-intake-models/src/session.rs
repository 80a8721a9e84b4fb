use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token issued at submission time and required on every later wizard step.
/// Lookups are scoped to the token, never to "the latest review".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CorrelationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_distinct() {
        let a = CorrelationToken::generate();
        let b = CorrelationToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
