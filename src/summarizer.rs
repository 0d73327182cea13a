//! Digest producer boundary: fallible remote summarization behind a
//! provider trait and registry. The pipeline-facing entry point fails
//! closed: any provider error or unparseable response becomes an empty
//! digest, never a run abort.

use crate::config::AppConfig;
use crate::types::{Article, DigestItem, DigestError, Result};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_ATTEMPTS: u32 = 3;
/// Per-article summary cap inside the prompt.
const PROMPT_SUMMARY_CHARS: usize = 300;

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Reduce a batch of articles to ranked digest items.
    async fn summarize(&self, articles: &[Article]) -> Result<Vec<DigestItem>>;
}

/// Registry mapping provider ids to implementations; adding a provider
/// means registering one here, nothing else changes.
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn Provider>>,
    default_id: String,
}

impl ProviderRegistry {
    pub fn new(default_id: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_id: default_id.into(),
        }
    }

    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, id: &str) -> Option<&dyn Provider> {
        self.providers.get(id).map(|p| p.as_ref())
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        let prompt = PromptSettings {
            max_items: config.max_news_items,
            language: config.digest_lang.clone(),
            sections: config.sections.known_ids().iter().map(|s| s.to_string()).collect(),
        };

        let mut registry = Self::new(config.ai_provider.clone());
        registry.register(Box::new(GeminiProvider {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            client: client.clone(),
            prompt: prompt.clone(),
        }));
        registry.register(Box::new(OpenAiProvider {
            id: "openai".to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.clone(),
            client: client.clone(),
            prompt: prompt.clone(),
        }));
        registry.register(Box::new(OpenAiProvider {
            id: "deepseek".to_string(),
            api_key: config.deepseek_api_key.clone(),
            model: config.deepseek_model.clone(),
            base_url: config.deepseek_base_url.clone(),
            client,
            prompt,
        }));
        registry
    }
}

/// Pipeline-facing entry point. Empty input never makes a network call;
/// unknown provider ids and provider failures degrade to an empty digest.
pub async fn summarize_with(
    registry: &ProviderRegistry,
    provider_id: Option<&str>,
    articles: &[Article],
) -> Vec<DigestItem> {
    if articles.is_empty() {
        info!("summarize: no articles to process");
        return Vec::new();
    }

    let id = provider_id.unwrap_or_else(|| registry.default_id());
    let Some(provider) = registry.get(id) else {
        error!(
            "summarize: unknown provider '{}', available: {:?}",
            id,
            registry.ids()
        );
        return Vec::new();
    };

    info!("summarize: {} articles via {}", articles.len(), id);
    match provider.summarize(articles).await {
        Ok(items) => {
            info!("summarize: {} digest items", items.len());
            items
        }
        Err(e) => {
            error!("summarize failed [{}]: {}", id, e);
            Vec::new()
        }
    }
}

// ── Prompting and response parsing ──────────────────────────────────

#[derive(Debug, Clone)]
struct PromptSettings {
    max_items: usize,
    language: String,
    sections: Vec<String>,
}

fn system_prompt(settings: &PromptSettings) -> String {
    format!(
        "You are a professional news editor. From the article list you are \
         given, select at most {max} of the most important items. Prefer \
         major AI/technology developments, AI policy, and significant \
         geopolitical events; drop ads, promotional posts and duplicates.\n\
         For each selected item produce:\n\
         - title: headline translated into {lang}\n\
         - summary: 3-5 sentence summary in {lang}\n\
         - importance: integer 1-10\n\
         - section: one of {sections}\n\
         - url: the original article URL, unchanged\n\
         Sort by importance descending. Respond with a raw JSON array only, \
         no surrounding prose.",
        max = settings.max_items,
        lang = settings.language,
        sections = settings.sections.join(" | "),
    )
}

fn user_prompt(articles: &[Article], settings: &PromptSettings) -> String {
    let mut items = Vec::with_capacity(articles.len());
    for (i, article) in articles.iter().enumerate() {
        let summary: String = article.summary.chars().take(PROMPT_SUMMARY_CHARS).collect();
        items.push(format!(
            "[{n}] title: {title}\n    source: {source} | category: {category}\n    \
             summary: {summary}\n    url: {url}",
            n = i + 1,
            title = article.title,
            source = article.source,
            category = article.category,
            url = article.url,
        ));
    }
    format!(
        "Here are {count} articles collected today. Select the most important \
         (at most {max}) and summarize them:\n\n{body}",
        count = articles.len(),
        max = settings.max_items,
        body = items.join("\n\n"),
    )
}

#[derive(Debug, Deserialize)]
struct RawDigestItem {
    #[serde(default)]
    section: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    importance: i64,
    #[serde(default)]
    url: String,
}

/// Extract the outermost JSON array from a model response and validate each
/// element; items failing validation are dropped, not propagated.
pub fn parse_digest(text: &str, max_items: usize) -> Result<Vec<DigestItem>> {
    let cleaned: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let start = cleaned.find('[');
    let end = cleaned.rfind(']');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(DigestError::Provider(
            "no JSON array in provider response".to_string(),
        ));
    };
    if end < start {
        return Err(DigestError::Provider(
            "malformed JSON array in provider response".to_string(),
        ));
    }

    let raw_items: Vec<RawDigestItem> = serde_json::from_str(&cleaned[start..=end])?;

    let mut items = Vec::new();
    for raw in raw_items {
        match validate_item(raw) {
            Ok(item) => items.push(item),
            Err(reason) => warn!("dropping invalid digest item: {}", reason),
        }
    }
    items.truncate(max_items);
    Ok(items)
}

fn validate_item(raw: RawDigestItem) -> std::result::Result<DigestItem, String> {
    if raw.title.trim().is_empty() {
        return Err("empty title".to_string());
    }
    if !(1..=10).contains(&raw.importance) {
        return Err(format!("importance {} out of range", raw.importance));
    }
    if url::Url::parse(&raw.url).is_err() {
        return Err(format!("unparseable url '{}'", raw.url));
    }
    let section = if raw.section.trim().is_empty() {
        "other".to_string()
    } else {
        raw.section.trim().to_string()
    };
    Ok(DigestItem {
        section,
        title: raw.title.trim().to_string(),
        summary: raw.summary.trim().to_string(),
        importance: raw.importance as u8,
        url: raw.url.trim().to_string(),
    })
}

// ── HTTP plumbing ───────────────────────────────────────────────────

/// Send a JSON request, retrying transient failures with exponential
/// backoff before giving up.
async fn send_with_retry(request: RequestBuilder) -> Result<Value> {
    let mut backoff = ExponentialBackoff {
        current_interval: Duration::from_secs(2),
        initial_interval: Duration::from_secs(2),
        max_interval: Duration::from_secs(15),
        max_elapsed_time: Some(Duration::from_secs(60)),
        ..Default::default()
    };

    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let Some(req) = request.try_clone() else {
            break;
        };
        match execute(req).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("provider request attempt {} failed: {}", attempt, e);
                last_err = Some(e);
                if attempt < MAX_ATTEMPTS {
                    if let Some(delay) = backoff.next_backoff() {
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                }
            }
        }
    }
    Err(last_err
        .unwrap_or_else(|| DigestError::Provider("request could not be sent".to_string())))
}

async fn execute(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.json::<Value>().await?)
}

// ── Gemini ──────────────────────────────────────────────────────────

pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: Client,
    prompt: PromptSettings,
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn summarize(&self, articles: &[Article]) -> Result<Vec<DigestItem>> {
        if self.api_key.is_empty() {
            return Err(DigestError::Provider(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let text = format!(
            "{}\n\n{}",
            system_prompt(&self.prompt),
            user_prompt(articles, &self.prompt)
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": text }] }]
        });

        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let value = send_with_retry(request).await?;

        let text = value
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DigestError::Provider("gemini response missing candidate text".to_string())
            })?;
        parse_digest(text, self.prompt.max_items)
    }
}

// ── OpenAI-compatible (OpenAI, DeepSeek) ────────────────────────────

pub struct OpenAiProvider {
    id: String,
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    prompt: PromptSettings,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn summarize(&self, articles: &[Article]) -> Result<Vec<DigestItem>> {
        if self.api_key.is_empty() {
            return Err(DigestError::Provider(format!(
                "{} API key is not configured",
                self.id
            )));
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt(&self.prompt) },
                { "role": "user", "content": user_prompt(articles, &self.prompt) }
            ],
            "temperature": 0.3
        });

        let request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        let value = send_with_retry(request).await?;

        let text = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DigestError::Provider(format!("{} response missing message content", self.id))
            })?;
        parse_digest(text, self.prompt.max_items)
    }
}
