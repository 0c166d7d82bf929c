//! Client for the Anthropic Messages API.
//!
//! Only non-streaming completions are supported. The reply is the first
//! text block of the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};

use crate::chat::history::ApiMessage;
use crate::chat::models::Role;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Claude API error ({status}): {details}")]
    Api { status: u16, details: String },
    #[error("request to Claude API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response did not contain any text")]
    MissingText,
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ModelError {
    /// HTTP status reported by the remote, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ModelError::Api { status, .. } => Some(*status),
            ModelError::Transport(err) => err.status().map(|s| s.as_u16()),
            ModelError::MissingText | ModelError::InvalidConfig(_) => None,
        }
    }
}

/// A remote chat completion model. Implementations are shared across
/// concurrent requests and must be stateless per call.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn send(
        &self,
        system: &str,
        messages: &[ApiMessage],
        max_tokens: u32,
        model: &str,
    ) -> Result<String, ModelError>;
}

/// Sends a tiny prompt to verify the API key and model are usable.
pub async fn check_connection(client: &dyn ChatModel, model: &str) -> bool {
    let messages = [ApiMessage::new(Role::User, "Hello".into())];
    match client.send("", &messages, 10, model).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Connection check failed: {}", e);
            false
        }
    }
}

#[derive(Serialize, Debug)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ApiMessage],
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

// {"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}
#[derive(Deserialize, Debug)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct AnthropicClient {
    http_client: reqwest::Client,
    api_hostname: String,
}

impl AnthropicClient {
    pub fn new(api_hostname: &str, api_key: &str) -> Result<Self, ModelError> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(api_key)
            .map_err(|e| ModelError::InvalidConfig(format!("API key: {}", e)))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60 * 10))
            .build()?;

        Ok(Self {
            http_client,
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn send(
        &self,
        system: &str,
        messages: &[ApiMessage],
        max_tokens: u32,
        model: &str,
    ) -> Result<String, ModelError> {
        let request = MessagesRequest {
            model,
            max_tokens,
            system: (!system.is_empty()).then_some(system),
            messages,
        };
        let url = format!("{}/v1/messages", self.api_hostname);

        tracing::debug!(
            "Sending {} messages to {} using {}",
            messages.len(),
            url,
            model
        );

        let response = self.http_client.post(url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let details = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelError::Api {
                status: status.as_u16(),
                details,
            });
        }

        let completion: MessagesResponse = response.json().await?;
        completion
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .ok_or(ModelError::MissingText)
    }
}
