//! Partitions fetched articles into new vs already-seen. Read-only with
//! respect to the store; committing seen state after delivery is the
//! pipeline's job.

use crate::store::SeenStore;
use crate::types::{Article, Result};
use std::collections::HashSet;
use tracing::info;

/// Returns the order-preserving subsequence of `articles` whose URL has no
/// seen-entry, together with those URLs (the commit set for this batch).
pub async fn partition_new(
    articles: Vec<Article>,
    store: &SeenStore,
) -> Result<(Vec<Article>, Vec<String>)> {
    if articles.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let urls: Vec<String> = articles.iter().map(|a| a.url.clone()).collect();
    let new_urls = store.filter_new(&urls).await?;
    let new_set: HashSet<&str> = new_urls.iter().map(String::as_str).collect();

    let total = articles.len();
    let new_articles: Vec<Article> = articles
        .into_iter()
        .filter(|a| new_set.contains(a.url.as_str()))
        .collect();

    info!("novelty: {} of {} articles are new", new_articles.len(), total);
    Ok((new_articles, new_urls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn article(url: &str) -> Article {
        Article {
            title: format!("title {url}"),
            url: url.to_string(),
            summary: String::new(),
            source: "test".to_string(),
            category: "ai".to_string(),
            published: None,
            extra: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn empty_input_returns_empty_without_store_queries() {
        let store = SeenStore::open_in_memory().await.unwrap();
        let (new_articles, new_urls) = partition_new(Vec::new(), &store).await.unwrap();
        assert!(new_articles.is_empty());
        assert!(new_urls.is_empty());
    }

    #[tokio::test]
    async fn seen_articles_are_dropped_order_preserved() {
        let store = SeenStore::open_in_memory().await.unwrap();
        store
            .mark_seen(&["https://a/2".to_string()])
            .await
            .unwrap();

        let batch = vec![
            article("https://a/1"),
            article("https://a/2"),
            article("https://a/3"),
        ];
        let (new_articles, new_urls) = partition_new(batch, &store).await.unwrap();

        let urls: Vec<&str> = new_articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a/1", "https://a/3"]);
        assert_eq!(new_urls, vec!["https://a/1", "https://a/3"]);
    }
}
