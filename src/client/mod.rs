//! HTTP client for the chat API, used by the terminal chat.
mod transcript;

pub use transcript::{Entry, PendingId, Transcript};

use anyhow::{Error, Result, anyhow};
use serde_json::{Value, json};

use crate::api::public::ErrorResponse;
use crate::api::public::chat::{ChatRequest, ChatResponse};
use crate::api::public::conversations::{Conversation, ConversationSummary};
use crate::chat::attachment::ImageAttachment;

pub struct ChatClient {
    http_client: reqwest::Client,
    base_url: String,
}

// Turn a non-success response into an error carrying the server's
// error message
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let msg = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse {
            error,
            details: Some(details),
        }) => format!("{}: {}", error, details),
        Ok(ErrorResponse { error, .. }) => error,
        Err(_) => body,
    };
    Err(anyhow!("{} ({})", msg, status.as_u16()))
}

impl ChatClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        // The session cookie from `login` is kept for later requests
        let http_client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn login(&self, password: &str) -> Result<(), Error> {
        let response = self
            .http_client
            .post(self.url("/auth/verify"))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }

    pub async fn send(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        images: &[ImageAttachment],
    ) -> Result<ChatResponse, Error> {
        let request = ChatRequest {
            message: Some(Value::String(message.to_string())),
            conversation_id: conversation_id.map(String::from),
            images: (!images.is_empty()).then(|| images.to_vec()),
        };
        let response = self
            .http_client
            .post(self.url("/chat"))
            .json(&request)
            .send()
            .await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, Error> {
        let response = self
            .http_client
            .get(self.url("/conversations"))
            .send()
            .await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    pub async fn conversation(&self, id: &str) -> Result<Conversation, Error> {
        let response = self
            .http_client
            .get(self.url(&format!("/conversations/{}", id)))
            .send()
            .await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let response = self
            .http_client
            .delete(self.url(&format!("/conversations/{}", id)))
            .send()
            .await?;
        error_for_status(response).await?;
        Ok(())
    }
}
