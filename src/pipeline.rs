//! Single-pass pipeline orchestration: fetch → filter → summarize →
//! deliver → commit. The orchestrator is the only writer of seen state,
//! and commits a batch only after every requested channel confirmed
//! delivery.

use crate::catalog;
use crate::channels::{self, ChannelRegistry, DeliveryReport};
use crate::config::AppConfig;
use crate::fetcher::Fetcher;
use crate::novelty;
use crate::store::SeenStore;
use crate::summarizer::{self, ProviderRegistry};
use crate::types::{Article, FeedSource, Result};
use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Fetch and filter only; commits seen state but skips summarization
    /// and delivery.
    pub dry_run: bool,
    /// Summarization provider override.
    pub provider: Option<String>,
    /// Delivery channel override.
    pub channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NothingFetched,
    NothingNew,
    DryRun,
    EmptyDigest,
    Delivered,
    DeliveryFailed,
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub fetched: usize,
    pub new: usize,
    pub digested: usize,
    pub delivery: DeliveryReport,
    pub committed: bool,
    pub outcome: RunOutcome,
}

pub struct Pipeline {
    fetcher: Fetcher,
    store: SeenStore,
    providers: ProviderRegistry,
    channels: ChannelRegistry,
    sources: Vec<FeedSource>,
    retention: Duration,
    default_channels: Vec<String>,
}

impl Pipeline {
    pub fn new(config: &AppConfig, store: SeenStore) -> Self {
        Self::with_parts(
            config,
            store,
            ProviderRegistry::from_config(config),
            ChannelRegistry::from_config(config),
            catalog::all_sources(config),
        )
    }

    /// Assemble a pipeline from caller-supplied registries and sources.
    pub fn with_parts(
        config: &AppConfig,
        store: SeenStore,
        providers: ProviderRegistry,
        channels: ChannelRegistry,
        sources: Vec<FeedSource>,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(config),
            store,
            providers,
            channels,
            sources,
            retention: Duration::days(config.retention_days),
            default_channels: config.notify_via.clone(),
        }
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// One end-to-end run: fetch every configured source, then process the
    /// batch.
    pub async fn run(&self, opts: &RunOptions) -> Result<RunReport> {
        let articles = self.fetcher.fetch_all(&self.sources).await;
        self.run_batch(articles, opts).await
    }

    /// Run the post-fetch stages on an already-fetched batch.
    pub async fn run_batch(&self, articles: Vec<Article>, opts: &RunOptions) -> Result<RunReport> {
        let mut report = RunReport {
            run_id: Uuid::new_v4(),
            fetched: articles.len(),
            new: 0,
            digested: 0,
            delivery: DeliveryReport::default(),
            committed: false,
            outcome: RunOutcome::NothingFetched,
        };

        if articles.is_empty() {
            warn!("no articles fetched, run ends");
            return Ok(self.finish(report));
        }

        // Retention cleanup runs before filtering so it never rejects
        // fresh data mid-run. Store errors are fatal for the run.
        self.store.cleanup(self.retention).await?;

        let (new_articles, new_urls) = novelty::partition_new(articles, &self.store).await?;
        report.new = new_articles.len();
        if new_articles.is_empty() {
            info!("all {} fetched articles already processed", report.fetched);
            report.outcome = RunOutcome::NothingNew;
            return Ok(self.finish(report));
        }

        if opts.dry_run {
            for (i, article) in new_articles.iter().enumerate() {
                info!(
                    "[dry-run] [{}] [{}] {} — {} ({})",
                    i + 1,
                    article.category.to_uppercase(),
                    article.title,
                    article.source,
                    article.url
                );
            }
            // Seen state still commits so the batch is not refetched and
            // re-summarized on the next real run.
            self.store.mark_seen(&new_urls).await?;
            report.committed = true;
            report.outcome = RunOutcome::DryRun;
            return Ok(self.finish(report));
        }

        let digest =
            summarizer::summarize_with(&self.providers, opts.provider.as_deref(), &new_articles)
                .await;
        report.digested = digest.len();
        if digest.is_empty() {
            // No delivery and no commit: the batch stays eligible for the
            // next run instead of being silently dropped.
            warn!("empty digest, run ends without delivery or commit");
            report.outcome = RunOutcome::EmptyDigest;
            return Ok(self.finish(report));
        }

        let channel_ids = opts
            .channels
            .clone()
            .unwrap_or_else(|| self.default_channels.clone());
        report.delivery = channels::deliver(&self.channels, &digest, &channel_ids).await;

        if report.delivery.all_ok {
            // Every new-classified URL commits, including ones the producer
            // discarded as unimportant: they have been seen by a completed
            // run and must not be re-summarized.
            self.store.mark_seen(&new_urls).await?;
            report.committed = true;
            report.outcome = RunOutcome::Delivered;
        } else {
            error!("delivery failed, batch left uncommitted for redelivery next run");
            report.outcome = RunOutcome::DeliveryFailed;
        }
        Ok(self.finish(report))
    }

    fn finish(&self, report: RunReport) -> RunReport {
        let delivered = report
            .delivery
            .per_channel
            .values()
            .filter(|ok| **ok)
            .count();
        info!(
            run_id = %report.run_id,
            fetched = report.fetched,
            new = report.new,
            digested = report.digested,
            delivered,
            committed = report.committed,
            outcome = ?report.outcome,
            "run summary"
        );
        report
    }
}
