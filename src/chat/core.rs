use std::sync::Arc;

use anyhow::anyhow;

use super::attachment::ImageAttachment;
use super::content::{self, ImageSource};
use super::db::ConversationStore;
use super::history::{self, ApiMessage};
use super::models::{Message, Role, derive_title};
use crate::anthropic::{ChatModel, ModelError};

const DEFAULT_REMOTE_STATUS: u16 = 500;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("message required")]
    Missing,
    #[error("message empty")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("{details}")]
    RemoteApi { status: u16, details: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ModelError> for TurnError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Api { status, details } => TurnError::RemoteApi { status, details },
            err => TurnError::RemoteApi {
                status: err.status().unwrap_or(DEFAULT_REMOTE_STATUS),
                details: err.to_string(),
            },
        }
    }
}

/// Fixed parameters sent with every request to the model.
#[derive(Clone, Debug)]
pub struct ModelSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_message: String,
}

#[derive(Clone, Debug, Default)]
pub struct TurnRequest {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
    pub images: Vec<ImageAttachment>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnReply {
    pub reply: String,
    pub conversation_id: String,
}

/// Runs a single chat turn: validate the message, load the conversation
/// if there is one, ask the model for a reply, then record both messages.
///
/// Nothing is written unless the model replied so a failed turn leaves
/// no trace in the store. Turns on the same conversation are not
/// serialized against each other.
#[derive(Clone)]
pub struct Chat {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ChatModel>,
    settings: ModelSettings,
}

impl Chat {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        settings: ModelSettings,
    ) -> Self {
        Self {
            store,
            model,
            settings,
        }
    }

    pub async fn turn(&self, request: TurnRequest) -> Result<TurnReply, TurnError> {
        let message = validate_message(request.message.as_deref())?;

        let existing = match request.conversation_id.as_deref() {
            Some(id) => {
                let found = self.store.find_by_id(id).await?;
                if found.is_none() {
                    tracing::debug!("Conversation {} not found, starting a new one", id);
                }
                found
            }
            None => None,
        };

        let mut messages = existing
            .as_ref()
            .map(|c| history::format(&c.messages))
            .unwrap_or_default();
        let (images, sources) = accept_attachments(request.images);
        messages.push(ApiMessage::new(
            Role::User,
            content::build(message, &sources),
        ));

        let reply = self
            .model
            .send(
                &self.settings.system_message,
                &messages,
                self.settings.max_tokens,
                &self.settings.model,
            )
            .await?;

        let exchange = [Message::user(message, images), Message::assistant(&reply)];
        let conversation_id = match existing {
            Some(conversation) => {
                self.store
                    .append_messages(&conversation.id, exchange)
                    .await?
                    .ok_or_else(|| {
                        anyhow!(
                            "Conversation {} was deleted during the turn",
                            conversation.id
                        )
                    })?
                    .id
            }
            None => {
                let title = derive_title(message);
                self.store.create(&title, exchange.to_vec()).await?.id
            }
        };

        tracing::debug!("Completed turn for conversation {}", conversation_id);

        Ok(TurnReply {
            reply,
            conversation_id,
        })
    }
}

fn validate_message(message: Option<&str>) -> Result<&str, InvalidInput> {
    match message {
        None | Some("") => Err(InvalidInput::Missing),
        Some(m) if m.trim().is_empty() => Err(InvalidInput::Empty),
        Some(m) => Ok(m),
    }
}

/// Split attachments into the ones that can be sent and their API
/// sources. Rejected attachments are dropped without failing the turn.
fn accept_attachments(
    attachments: Vec<ImageAttachment>,
) -> (Vec<ImageAttachment>, Vec<ImageSource>) {
    let mut accepted = Vec::new();
    let mut sources = Vec::new();
    for attachment in attachments {
        match attachment.validate() {
            Ok(source) => {
                sources.push(source);
                accepted.push(attachment);
            }
            Err(e) => {
                tracing::warn!(
                    "Dropping attachment {}: {}",
                    attachment.name.as_deref().unwrap_or("<unnamed>"),
                    e
                );
            }
        }
    }
    (accepted, sources)
}
