//! Concurrent multi-source feed retrieval and normalization.
//!
//! Each source is fetched under a global in-flight cap; any per-source
//! failure (transport, timeout, unparseable payload) degrades to zero
//! records for that source and never aborts its siblings.

use crate::config::AppConfig;
use crate::types::{Article, FeedSource};
use crate::utils::{strip_html, truncate_chars};
use chrono::{DateTime, Duration, Utc};
use feed_rs::parser;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashMap;
use tracing::{info, warn};

const USER_AGENT: &str = "news-digest/0.1";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const TOTAL_TIMEOUT_SECS: u64 = 20;
const MAX_SUMMARY_CHARS: usize = 500;

pub struct Fetcher {
    client: Client,
    fetch_hours: i64,
    concurrency: usize,
}

impl Fetcher {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            fetch_hours: config.fetch_hours,
            concurrency: config.fetch_concurrency.max(1),
        }
    }

    /// Fetch every source concurrently (bounded in-flight) and return the
    /// union of their normalized articles. Partial success is the normal
    /// case; this never fails as a whole.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<Article> {
        let batches: Vec<Vec<Article>> = stream::iter(sources)
            .map(|source| self.fetch_one(source))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let articles: Vec<Article> = batches.into_iter().flatten().collect();
        info!(
            "fetch complete: {} articles from {} sources",
            articles.len(),
            sources.len()
        );
        articles
    }

    async fn fetch_one(&self, source: &FeedSource) -> Vec<Article> {
        let body = match self.get_text(&source.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("feed fetch failed [{}]: {}", source.name, e);
                return Vec::new();
            }
        };

        let horizon = Utc::now() - Duration::hours(self.fetch_hours);
        let articles = articles_from_feed(&body, source, horizon);
        if articles.is_empty() {
            warn!("feed [{}]: no usable entries", source.name);
        } else {
            info!("feed [{}]: {} fresh articles", source.name, articles.len());
        }
        articles
    }

    async fn get_text(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

/// Parse a feed payload and normalize its entries. A payload that fails to
/// parse yields zero articles, same as a fetch error. Within a source the
/// original feed order is preserved.
pub fn articles_from_feed(
    body: &str,
    source: &FeedSource,
    horizon: DateTime<Utc>,
) -> Vec<Article> {
    let feed = match parser::parse(body.as_bytes()) {
        Ok(feed) => feed,
        Err(e) => {
            warn!("feed parse failed [{}]: {}", source.name, e);
            return Vec::new();
        }
    };

    feed.entries
        .into_iter()
        .filter_map(|entry| normalize_entry(entry, source, horizon))
        .collect()
}

/// Entries missing a title or link are dropped. Entries published before
/// `horizon` are dropped; unknown recency is kept.
fn normalize_entry(
    entry: feed_rs::model::Entry,
    source: &FeedSource,
    horizon: DateTime<Utc>,
) -> Option<Article> {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();
    let url = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let published = entry.published.or(entry.updated);
    if let Some(published) = published {
        if published < horizon {
            return None;
        }
    }

    let raw_summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let summary = truncate_chars(&strip_html(&raw_summary), MAX_SUMMARY_CHARS);

    Some(Article {
        title,
        url,
        summary,
        source: source.name.clone(),
        category: source.category.clone(),
        published,
        extra: HashMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> FeedSource {
        FeedSource::new("Test Feed", "https://feed.example/rss", "ai")
    }

    fn rss(items: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>t</title>{items}</channel></rss>"
        )
    }

    fn item(title: &str, link: &str, published: Option<DateTime<Utc>>, desc: &str) -> String {
        let pub_date = published
            .map(|d| format!("<pubDate>{}</pubDate>", d.to_rfc2822()))
            .unwrap_or_default();
        format!(
            "<item><title>{title}</title><link>{link}</link>\
             <description><![CDATA[{desc}]]></description>{pub_date}</item>"
        )
    }

    #[test]
    fn fresh_entries_kept_stale_dropped() {
        let now = Utc::now();
        let body = rss(&format!(
            "{}{}",
            item("fresh", "https://a/1", Some(now - Duration::hours(1)), "x"),
            item("stale", "https://a/2", Some(now - Duration::hours(48)), "x"),
        ));
        let articles = articles_from_feed(&body, &source(), now - Duration::hours(24));
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh"]);
    }

    #[test]
    fn unknown_recency_is_kept() {
        let body = rss(&item("undated", "https://a/1", None, "x"));
        let articles = articles_from_feed(&body, &source(), Utc::now() - Duration::hours(24));
        assert_eq!(articles.len(), 1);
        assert!(articles[0].published.is_none());
    }

    #[test]
    fn entries_missing_title_or_link_dropped() {
        let now = Utc::now();
        let body = rss(&format!(
            "<item><link>https://a/1</link></item>\
             <item><title>no link</title></item>\
             {}",
            item("ok", "https://a/2", Some(now), "x"),
        ));
        let articles = articles_from_feed(&body, &source(), now - Duration::hours(24));
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["ok"]);
    }

    #[test]
    fn feed_order_preserved_within_source() {
        let now = Utc::now();
        let body = rss(&format!(
            "{}{}{}",
            item("first", "https://a/1", Some(now), "x"),
            item("second", "https://a/2", Some(now), "x"),
            item("third", "https://a/3", Some(now), "x"),
        ));
        let articles = articles_from_feed(&body, &source(), now - Duration::hours(24));
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn malformed_payload_yields_zero_articles() {
        let articles =
            articles_from_feed("this is not xml", &source(), Utc::now() - Duration::hours(24));
        assert!(articles.is_empty());
    }

    #[test]
    fn summary_is_html_stripped_and_truncated() {
        let now = Utc::now();
        let long = "word ".repeat(200);
        let body = rss(&item(
            "t",
            "https://a/1",
            Some(now),
            &format!("<p>lead</p> {long}"),
        ));
        let articles = articles_from_feed(&body, &source(), now - Duration::hours(24));
        let summary = &articles[0].summary;
        assert!(summary.starts_with("lead word"));
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= MAX_SUMMARY_CHARS);
    }
}
