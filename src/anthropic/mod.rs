mod claude;

pub use claude::{AnthropicClient, ChatModel, ModelError, check_connection};
