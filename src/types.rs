use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One feed endpoint to pull from. Static configuration, not runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub category: String,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category: category.to_string(),
        }
    }
}

/// One normalized fetched item. `url` is the identity key; immutable once
/// constructed by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub source: String,
    pub category: String,
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// A ranked, translated summary unit ready for delivery. Built from the
/// summarization provider's response after validation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestItem {
    pub section: String,
    pub title: String,
    pub summary: String,
    /// 1..=10, validated when the provider response is parsed.
    pub importance: u8,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DigestError>;
