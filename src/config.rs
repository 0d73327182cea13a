//! Process configuration, loaded once from the environment at startup and
//! passed by reference into each component. No component reads ambient
//! environment state after this.

use crate::render::SectionTable;
use crate::types::{DigestError, Result};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Default summarization provider id: "gemini" | "openai" | "deepseek".
    pub ai_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub deepseek_api_key: String,
    pub deepseek_model: String,
    pub deepseek_base_url: String,

    pub serverchan_key: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub email_to: String,
    /// Default delivery channel ids, overridable per run.
    pub notify_via: Vec<String>,

    /// Freshness horizon for fetched entries, in hours.
    pub fetch_hours: i64,
    /// Cap on digest items requested from the provider.
    pub max_news_items: usize,
    /// Language the provider translates titles and summaries into.
    pub digest_lang: String,
    /// Seen-url retention horizon, in days.
    pub retention_days: i64,
    /// Global cap on concurrent in-flight feed requests.
    pub fetch_concurrency: usize,
    pub database_path: PathBuf,

    /// X accounts routed through the feed pipeline via a Nitter instance.
    pub nitter_instance: String,
    pub nitter_accounts: Vec<String>,

    pub sections: SectionTable,
}

impl AppConfig {
    /// Load configuration from environment variables. Call
    /// `dotenvy::dotenv().ok()` first for local `.env` support.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ai_provider: env_or("AI_PROVIDER", "gemini").to_lowercase(),
            gemini_api_key: env_or("GEMINI_API_KEY", ""),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            deepseek_api_key: env_or("DEEPSEEK_API_KEY", ""),
            deepseek_model: env_or("DEEPSEEK_MODEL", "deepseek-reasoner"),
            deepseek_base_url: env_or("DEEPSEEK_BASE_URL", "https://api.deepseek.com"),
            serverchan_key: env_or("SERVERCHAN_KEY", ""),
            telegram_bot_token: env_or("TELEGRAM_BOT_TOKEN", ""),
            telegram_chat_id: env_or("TELEGRAM_CHAT_ID", ""),
            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env_parse("SMTP_PORT", 587)?,
            smtp_user: env_or("SMTP_USER", ""),
            smtp_password: env_or("SMTP_PASSWORD", ""),
            email_to: env_or("EMAIL_TO", ""),
            notify_via: env_csv("NOTIFY_VIA", "wechat"),
            fetch_hours: env_parse("FETCH_HOURS", 24)?,
            max_news_items: env_parse("MAX_NEWS_ITEMS", 20)?,
            digest_lang: env_or("DIGEST_LANG", "Chinese"),
            retention_days: env_parse("RETENTION_DAYS", 30)?,
            fetch_concurrency: env_parse("FETCH_CONCURRENCY", 5)?,
            database_path: PathBuf::from(env_or("DATABASE_PATH", "data/history.db")),
            nitter_instance: env_or("NITTER_INSTANCE", "https://nitter.net"),
            nitter_accounts: env_csv("NITTER_ACCOUNTS", ""),
            sections: SectionTable::default(),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_provider: "gemini".to_string(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            deepseek_api_key: String::new(),
            deepseek_model: "deepseek-reasoner".to_string(),
            deepseek_base_url: "https://api.deepseek.com".to_string(),
            serverchan_key: String::new(),
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            email_to: String::new(),
            notify_via: vec!["wechat".to_string()],
            fetch_hours: 24,
            max_news_items: 20,
            digest_lang: "Chinese".to_string(),
            retention_days: 30,
            fetch_concurrency: 5,
            database_path: PathBuf::from("data/history.db"),
            nitter_instance: "https://nitter.net".to_string(),
            nitter_accounts: Vec::new(),
            sections: SectionTable::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val
            .trim()
            .parse()
            .map_err(|e| DigestError::Config(format!("invalid {key}: {e}"))),
        _ => Ok(default),
    }
}

/// Comma-separated list variable; entries are trimmed and lowercased.
fn env_csv(key: &str, default: &str) -> Vec<String> {
    env_or(key, default)
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
