//! Telegram delivery via the Bot API.

use crate::channels::Channel;
use crate::config::AppConfig;
use crate::render::{self, SectionTable};
use crate::types::{DigestError, DigestItem, Result};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const SEND_TIMEOUT_SECS: u64 = 15;
/// Hard limit of the Bot API's sendMessage text field.
const MAX_MESSAGE_CHARS: usize = 4096;

pub struct TelegramChannel {
    bot_token: String,
    chat_id: String,
    sections: SectionTable,
    client: Client,
}

impl TelegramChannel {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            sections: config.sections.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, digest: &[DigestItem]) -> Result<()> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            return Err(DigestError::Channel(
                "TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID is not configured".to_string(),
            ));
        }

        let content = truncate_chars(
            &render::to_markdown(digest, &self.sections),
            MAX_MESSAGE_CHARS,
        );

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = json!({
            "chat_id": self.chat_id,
            "text": content,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let result: Value = response.json().await?;

        if result.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(())
        } else {
            Err(DigestError::Channel(format!(
                "telegram rejected push: {result}"
            )))
        }
    }
}
