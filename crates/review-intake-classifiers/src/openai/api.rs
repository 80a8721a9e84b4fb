use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use crate::error::FailureKind;
use crate::traits::LabelProvider;

const SYSTEM_PROMPT: &str = "You are a sentiment analysis expert. Analyze the following review and respond with ONLY one word: 'positive', 'neutral', or 'negative'.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions endpoint asked for a single-word, zero-temperature label
pub struct OpenAiLabelProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAiLabelProvider {
    pub fn new(endpoint: String, model: String, api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("reviewgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint,
            model,
            api_key,
            timeout,
        }
    }

    fn request_body<'a>(&'a self, feedback: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: feedback },
            ],
            temperature: 0.0,
            max_tokens: 1,
        }
    }
}

fn classify_status(status: StatusCode) -> FailureKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        FailureKind::RateLimited
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        FailureKind::Timeout
    } else {
        FailureKind::Unrecoverable(format!("upstream returned {}", status))
    }
}

fn classify_transport(err: reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Unrecoverable(err.to_string())
    }
}

#[async_trait]
impl LabelProvider for OpenAiLabelProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn request_label(&self, feedback: &str) -> Result<String, FailureKind> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&self.request_body(feedback))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body: ChatResponse = response.json().await.map_err(classify_transport)?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(provider = "openai", raw_label = %content, "Received classification");
        Ok(content.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let provider = OpenAiLabelProvider::new(
            "https://api.openai.com/v1/chat/completions".to_string(),
            "gpt-3.5-turbo".to_string(),
            "sk-test".to_string(),
            Duration::from_secs(10),
        );
        let body = serde_json::to_value(provider.request_body("Great visit")).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 1);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Great visit");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), FailureKind::RateLimited);
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), FailureKind::Timeout);
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            FailureKind::Unrecoverable(_)
        ));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());

        let parsed: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
