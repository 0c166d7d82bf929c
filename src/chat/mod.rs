pub mod attachment;
pub mod content;
pub mod core;
pub mod db;
pub mod history;
pub mod models;

pub use self::core::{Chat, InvalidInput, ModelSettings, TurnError, TurnReply, TurnRequest};
pub use db::{ConversationStore, SqliteConversationStore};
