//! Public types for the chat API
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::attachment::ImageAttachment;

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    // Left untyped so a non-string message is reported as missing
    // rather than rejected by the extractor
    pub message: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageAttachment>>,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
}
