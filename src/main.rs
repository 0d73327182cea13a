use chrono::Utc;
use clap::Parser;
use news_digest::{AppConfig, Pipeline, RunOptions, RunOutcome, SeenStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "news-digest", about = "Scheduled AI news digest pipeline")]
struct Cli {
    /// Fetch and dedup only; skip summarization and delivery (seen state
    /// still commits).
    #[arg(long)]
    dry_run: bool,

    /// Override the summarization provider (gemini | openai | deepseek).
    #[arg(long)]
    provider: Option<String>,

    /// Override the delivery channels, comma-separated
    /// (wechat,telegram,email).
    #[arg(long)]
    notify: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let started = Utc::now();

    info!("news-digest run starting");

    let store = SeenStore::open(&config.database_path).await?;
    let pipeline = Pipeline::new(&config, store);

    let opts = RunOptions {
        dry_run: cli.dry_run,
        provider: cli.provider,
        channels: cli.notify.map(|list| {
            list.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        }),
    };

    let report = pipeline.run(&opts).await?;

    let elapsed = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
    match report.outcome {
        RunOutcome::DeliveryFailed => warn!(
            "run finished in {:.1}s with delivery failures; batch will be retried next run",
            elapsed
        ),
        _ => info!("run finished in {:.1}s", elapsed),
    }

    Ok(())
}
