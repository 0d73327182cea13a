//! WeChat push via the ServerChan relay API.

use crate::channels::Channel;
use crate::config::AppConfig;
use crate::render::{self, SectionTable};
use crate::types::{DigestError, DigestItem, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const SEND_TIMEOUT_SECS: u64 = 15;

pub struct ServerChanChannel {
    key: String,
    sections: SectionTable,
    client: Client,
}

impl ServerChanChannel {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            key: config.serverchan_key.clone(),
            sections: config.sections.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl Channel for ServerChanChannel {
    fn name(&self) -> &str {
        "wechat"
    }

    async fn send(&self, digest: &[DigestItem]) -> Result<()> {
        if self.key.is_empty() {
            return Err(DigestError::Channel(
                "SERVERCHAN_KEY is not configured".to_string(),
            ));
        }

        let url = format!("https://sctapi.ftqq.com/{}.send", self.key);
        let body = [
            ("title", render::digest_title()),
            ("desp", render::to_markdown(digest, &self.sections)),
        ];

        let response = self
            .client
            .post(&url)
            .form(&body)
            .send()
            .await?
            .error_for_status()?;
        let result: Value = response.json().await?;

        if result.get("code").and_then(Value::as_i64) == Some(0) {
            Ok(())
        } else {
            Err(DigestError::Channel(format!(
                "serverchan rejected push: {result}"
            )))
        }
    }
}
