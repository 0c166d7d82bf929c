//! Public types for the conversations API
pub use crate::chat::models::{Conversation, ConversationSummary, Message, Role};
