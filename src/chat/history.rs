use serde::{Deserialize, Serialize};

use super::content::Content;
use super::models::{Message, Role};

/// A message in the shape the model API expects.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ApiMessage {
    pub role: Role,
    pub content: Content,
}

impl ApiMessage {
    pub fn new(role: Role, content: Content) -> Self {
        Self { role, content }
    }
}

/// Project stored messages onto role and content, keeping order.
pub fn format(messages: &[Message]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|msg| ApiMessage::new(msg.role, msg.content.clone()))
        .collect()
}
