use chrono::{Duration, Utc};
use news_digest::SeenStore;

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn mark_seen_is_idempotent() {
    let store = SeenStore::open_in_memory().await.unwrap();
    let batch = urls(&["https://a/1", "https://a/2"]);

    store.mark_seen(&batch).await.unwrap();
    let after_once = store.count().await.unwrap();
    store.mark_seen(&batch).await.unwrap();

    assert_eq!(after_once, 2);
    assert_eq!(store.count().await.unwrap(), after_once);
    assert!(store.is_seen("https://a/1").await.unwrap());
    assert!(store.is_seen("https://a/2").await.unwrap());
}

#[tokio::test]
async fn filter_new_preserves_input_order() {
    let store = SeenStore::open_in_memory().await.unwrap();
    store.mark_seen(&urls(&["https://a/2"])).await.unwrap();

    let new_urls = store
        .filter_new(&urls(&["https://a/3", "https://a/2", "https://a/1"]))
        .await
        .unwrap();
    assert_eq!(new_urls, urls(&["https://a/3", "https://a/1"]));
}

#[tokio::test]
async fn dedup_across_two_runs() {
    let store = SeenStore::open_in_memory().await.unwrap();

    // First run delivers r1 and commits it.
    let r1 = urls(&["https://a/1", "https://a/2"]);
    store.mark_seen(&r1).await.unwrap();

    // Second run fetches a superset; only the additions are new.
    let r2 = urls(&["https://a/1", "https://a/2", "https://a/3", "https://a/4"]);
    let new_urls = store.filter_new(&r2).await.unwrap();
    assert_eq!(new_urls, urls(&["https://a/3", "https://a/4"]));
}

#[tokio::test]
async fn retention_boundary() {
    let store = SeenStore::open_in_memory().await.unwrap();
    store
        .mark_seen_at(&urls(&["https://old"]), Utc::now() - Duration::days(31))
        .await
        .unwrap();
    store
        .mark_seen_at(&urls(&["https://recent"]), Utc::now() - Duration::days(29))
        .await
        .unwrap();

    let deleted = store.cleanup(Duration::days(30)).await.unwrap();

    assert_eq!(deleted, 1);
    assert!(!store.is_seen("https://old").await.unwrap());
    assert!(store.is_seen("https://recent").await.unwrap());
}

#[tokio::test]
async fn cleanup_on_empty_store_deletes_nothing() {
    let store = SeenStore::open_in_memory().await.unwrap();
    assert_eq!(store.cleanup(Duration::days(30)).await.unwrap(), 0);
}

#[tokio::test]
async fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");

    {
        let store = SeenStore::open(&path).await.unwrap();
        store.mark_seen(&urls(&["https://a/1"])).await.unwrap();
    }

    let reopened = SeenStore::open(&path).await.unwrap();
    assert!(reopened.is_seen("https://a/1").await.unwrap());
    assert_eq!(reopened.count().await.unwrap(), 1);
}

#[test]
fn url_hash_is_stable_and_distinct() {
    let a = SeenStore::url_hash("https://a/1");
    let b = SeenStore::url_hash("https://a/2");
    assert_eq!(a, SeenStore::url_hash("https://a/1"));
    assert_ne!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn urls_differing_only_in_query_are_distinct() {
    // Identity is the raw URL string; no canonicalization is applied.
    let plain = SeenStore::url_hash("https://a/story");
    let tracked = SeenStore::url_hash("https://a/story?utm_source=feed");
    assert_ne!(plain, tracked);
}
