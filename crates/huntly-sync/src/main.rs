//! huntly - reconcile job-application mail into the record store.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use huntly_core::defaults;
use huntly_inference::OpenRouterBackend;
use huntly_mail::MailClient;
use huntly_store::{CompanyMatch, NotionStore};
use huntly_sync::{JsonFileCache, SyncConfig, SyncRunner};

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "huntly=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let source = Arc::new(MailClient::from_env()?);
    let backend = Arc::new(OpenRouterBackend::from_env()?);
    let mut store = NotionStore::from_env()?;
    if env_or("COMPANY_MATCH", String::new()) == "contains" {
        store = store.with_company_match(CompanyMatch::Contains);
    }

    let config = SyncConfig {
        query: env_or(
            "SYNC_QUERY",
            SyncConfig::default().query,
        ),
        max_results: env_or("SYNC_MAX_RESULTS", defaults::LIST_MAX_RESULTS),
        // 0 disables the recency window.
        newer_than_days: match env_or("SYNC_NEWER_THAN_DAYS", 7u32) {
            0 => None,
            days => Some(days),
        },
        concurrency: env_or("SYNC_CONCURRENCY", 4),
    };

    let cache_path = env_or("SYNC_CACHE_PATH", ".huntly-seen.json".to_string());
    let runner = SyncRunner::new(source, backend, Arc::new(store))
        .with_cache(Arc::new(JsonFileCache::new(cache_path)))
        .with_config(config);

    let report = if env_or("SYNC_BATCH", false) {
        runner.run_batch_on(chrono::Utc::now().date_naive()).await?
    } else {
        runner.run().await?
    };

    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        failures = report.failures.len(),
        "Done"
    );
    for failure in &report.failures {
        info!(message_id = %failure.message_id, error = %failure.error, "Message failed");
    }
    Ok(())
}
