use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::anthropic::ChatModel;
use crate::chat::{Chat, ConversationStore, SqliteConversationStore};
use crate::core::AppConfig;

pub struct AppState {
    pub chat: Chat,
    pub store: Arc<dyn ConversationStore>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Connection, model: Arc<dyn ChatModel>, config: AppConfig) -> Self {
        let store: Arc<dyn ConversationStore> = Arc::new(SqliteConversationStore::new(db));
        let chat = Chat::new(Arc::clone(&store), model, config.model_settings());
        Self {
            chat,
            store,
            config,
        }
    }
}
