/// LLM Client: the single point of entry for all model backend calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the backend over HTTP.
/// Callers depend on `ChatBackend`; `OllamaClient` is the production implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Model '{0}' is not available on the backend")]
    ModelNotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Only user turns are sent: each analysis is a single-message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Decoding controls forwarded to the backend.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecodingOptions {
    pub temperature: f32,
}

/// The model backend seam. Implement this to swap backends without touching
/// the orchestrator.
///
/// Carried in `AppState` as `Arc<dyn ChatBackend>`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one chat exchange and returns the reply text.
    async fn chat_complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &DecodingOptions,
    ) -> Result<String, LlmError>;

    /// Names of the models installed on the backend.
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a DecodingOptions,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaReplyMessage>,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Client for a locally hosted Ollama server.
/// Wraps the chat endpoint with retry on transient statuses.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    /// Retries on 429 and 5xx with exponential backoff. Connection failures
    /// return immediately.
    async fn chat_complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &DecodingOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        let request_body = OllamaChatRequest {
            model,
            messages,
            stream: false,
            options,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Chat call to {} attempt {} failed, retrying after {}ms...",
                    model,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.client.post(&url).json(&request_body).send().await?;
            let status = response.status();

            match classify_status(status) {
                StatusOutcome::Retry => {
                    let body = response.text().await.unwrap_or_default();
                    warn!("Backend returned {} for {}: {}", status, model, body);
                    last_error = Some(LlmError::Api {
                        status: status.as_u16(),
                        message: error_message(body),
                    });
                    continue;
                }
                StatusOutcome::ModelNotFound => {
                    return Err(LlmError::ModelNotFound(model.to_string()));
                }
                StatusOutcome::Fail => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(LlmError::Api {
                        status: status.as_u16(),
                        message: error_message(body),
                    });
                }
                StatusOutcome::Success => {}
            }

            let reply: OllamaChatResponse = response.json().await?;
            debug!(
                "Chat call to {} succeeded: eval_count={:?}, total_duration_ns={:?}",
                model, reply.eval_count, reply.total_duration
            );
            return reply_content(reply);
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::Unavailable(format!("no reply after {MAX_RETRIES} tries"))
        }))
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}{}", self.base_url, TAGS_PATH);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(body),
            });
        }
        let tags: OllamaTags = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// What a chat call does next given the backend's status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusOutcome {
    Success,
    Retry,
    ModelNotFound,
    Fail,
}

fn classify_status(status: StatusCode) -> StatusOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusOutcome::Retry
    } else if status == StatusCode::NOT_FOUND {
        StatusOutcome::ModelNotFound
    } else if status.is_success() {
        StatusOutcome::Success
    } else {
        StatusOutcome::Fail
    }
}

/// The reply text, or `EmptyContent` when the model said nothing.
fn reply_content(reply: OllamaChatResponse) -> Result<String, LlmError> {
    let content = reply.message.map(|m| m.content).unwrap_or_default();
    if content.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(content)
}

/// Pulls the `error` field out of an Ollama error body, falling back to the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let body = r#"{"error":"model \"llama9\" not found, try pulling it first"}"#.to_string();
        assert_eq!(
            error_message(body),
            "model \"llama9\" not found, try pulling it first"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("bad gateway".to_string()), "bad gateway");
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let options = DecodingOptions { temperature: 0.3 };
        let body = serde_json::to_value(OllamaChatRequest {
            model: "llama3",
            messages: &messages,
            stream: false,
            options: &options,
        })
        .unwrap();

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_chat_response_missing_message_is_tolerated() {
        let reply: OllamaChatResponse =
            serde_json::from_str(r#"{"model":"llama3","done":true}"#).unwrap();
        assert!(reply.message.is_none());
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::OK), StatusOutcome::Success);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), StatusOutcome::Retry);
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR), StatusOutcome::Retry);
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), StatusOutcome::Retry);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusOutcome::ModelNotFound);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), StatusOutcome::Fail);
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), StatusOutcome::Fail);
    }

    #[test]
    fn test_blank_reply_is_empty_content() {
        let reply: OllamaChatResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"  \n "}}"#).unwrap();
        assert!(matches!(reply_content(reply), Err(LlmError::EmptyContent)));

        let reply: OllamaChatResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(matches!(reply_content(reply), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_reply_content_is_returned_untrimmed() {
        let reply: OllamaChatResponse =
            serde_json::from_str(r#"{"message":{"content":" {\"Name\":\"Jane\"} "}}"#).unwrap();
        assert_eq!(reply_content(reply).unwrap(), r#" {"Name":"Jane"} "#);
    }

    #[test]
    fn test_tags_response_lists_names() {
        let tags: OllamaTags = serde_json::from_str(
            r#"{"models":[{"name":"llama3:latest","size":1},{"name":"mistral:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<_> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3:latest", "mistral:7b"]);
    }
}
