use std::env;

use crate::chat::ModelSettings;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a kind and knowledgeable AI assistant. \
Give accurate answers to the user's questions that are easy to understand.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: String,
    pub static_dir: String,
    pub anthropic_api_hostname: String,
    pub anthropic_api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub system_message: String,
    pub app_password: String,
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("CHATBOT_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = env::var("CHATBOT_DB_PATH").unwrap_or_else(|_| {
            format!("{}/chatbot.db", storage_path.trim_end_matches('/'))
        });
        let static_dir = env::var("CHATBOT_STATIC_DIR").unwrap_or("./web-ui".to_string());
        let anthropic_api_hostname = env::var("CHATBOT_ANTHROPIC_API_HOST")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let model = env::var("CHATBOT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = env::var("CHATBOT_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let system_message = env::var("CHATBOT_SYSTEM_MESSAGE")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_MESSAGE.to_string());
        let app_password = env::var("APP_PASSWORD").unwrap_or_else(|_| "chatbot2024".to_string());
        let secure_cookies = env::var("CHATBOT_SECURE_COOKIES")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            db_path,
            static_dir,
            anthropic_api_hostname,
            anthropic_api_key,
            model,
            max_tokens,
            system_message,
            app_password,
            secure_cookies,
        }
    }
}

impl AppConfig {
    /// The fixed parameters sent with every chat turn.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system_message: self.system_message.clone(),
        }
    }
}
