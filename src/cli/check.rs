use anyhow::{Result, bail};

use crate::anthropic::{AnthropicClient, check_connection};
use crate::core::AppConfig;

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let client = AnthropicClient::new(&config.anthropic_api_hostname, &config.anthropic_api_key)?;

    println!("Checking {} at {}...", config.model, config.anthropic_api_hostname);
    if !check_connection(&client, &config.model).await {
        bail!("Model API is not reachable, check ANTHROPIC_API_KEY and CHATBOT_MODEL");
    }
    println!("OK");
    Ok(())
}
