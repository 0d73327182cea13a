//! Built-in feed catalog plus config-driven expansion of X accounts into
//! Nitter RSS endpoints. Everything here is static data; runtime state
//! lives elsewhere.

use crate::config::AppConfig;
use crate::types::FeedSource;

pub fn ai_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "TechCrunch AI",
            "https://techcrunch.com/category/artificial-intelligence/feed/",
            "ai",
        ),
        FeedSource::new(
            "The Verge AI",
            "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
            "ai",
        ),
        FeedSource::new(
            "MIT Technology Review",
            "https://www.technologyreview.com/feed/",
            "ai",
        ),
        FeedSource::new(
            "Ars Technica AI",
            "https://feeds.arstechnica.com/arstechnica/technology-lab",
            "ai",
        ),
        FeedSource::new(
            "Hacker News AI",
            "https://hnrss.org/newest?q=AI+OR+LLM+OR+GPT",
            "ai",
        ),
        FeedSource::new("OpenAI Blog", "https://openai.com/blog/rss.xml", "ai"),
    ]
}

pub fn politics_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "BBC World News",
            "http://feeds.bbci.co.uk/news/world/rss.xml",
            "politics",
        ),
        FeedSource::new(
            "NPR Politics",
            "https://feeds.npr.org/1014/rss.xml",
            "politics",
        ),
        FeedSource::new(
            "Reuters World",
            "https://www.rss.reuters.com/news/worldNews",
            "politics",
        ),
        FeedSource::new(
            "AP News",
            "https://rsshub.app/apnews/topics/apf-topnews",
            "politics",
        ),
    ]
}

/// X accounts ride the same feed pipeline as everything else, via the
/// configured Nitter instance's per-user RSS endpoint.
pub fn nitter_sources(config: &AppConfig) -> Vec<FeedSource> {
    let instance = config.nitter_instance.trim_end_matches('/');
    config
        .nitter_accounts
        .iter()
        .map(|account| {
            FeedSource::new(
                &format!("X/@{account}"),
                &format!("{instance}/{account}/rss"),
                "x",
            )
        })
        .collect()
}

/// The full source set for one run.
pub fn all_sources(config: &AppConfig) -> Vec<FeedSource> {
    let mut sources = ai_sources();
    sources.extend(politics_sources());
    sources.extend(nitter_sources(config));
    sources
}
