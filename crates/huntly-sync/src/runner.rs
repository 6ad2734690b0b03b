//! Pipeline orchestration: list, classify, extract, resolve, merge.
//!
//! Classification and extraction are independent per message and run
//! with bounded concurrency. Resolution and merging run sequentially so
//! two messages about the same application in one run cannot race and
//! create duplicate records.

use chrono::{NaiveDate, Utc};
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use huntly_core::{
    defaults, ApplicationCandidate, GenerationBackend, MergeAction, Message, MessageSource,
    RecordStore, Result, SeenCache, Verdict,
};
use huntly_inference::RetryPolicy;

use crate::cache::NoopCache;
use crate::classify::Classifier;
use crate::extract::Extractor;
use crate::merge::{draft_from, merge_patch};
use crate::resolve::resolve;

/// Tuning knobs for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Source query selecting candidate mail.
    pub query: String,
    /// Page size for the id listing.
    pub max_results: u32,
    /// Recency window appended to the query, in days.
    pub newer_than_days: Option<u32>,
    /// Concurrent classification/extraction calls in flight.
    pub concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            query: "subject:(application OR interview OR offer)".to_string(),
            max_results: defaults::LIST_MAX_RESULTS,
            newer_than_days: Some(7),
            concurrency: 4,
        }
    }
}

/// One failed message and why. The run carries on past it.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub message_id: String,
    pub error: String,
}

/// Outcome counts for a run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: u32,
    pub updated: u32,
    /// Messages not merged: wrong verdict, already seen, or a no-op merge.
    pub skipped: u32,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn processed(&self) -> u32 {
        self.created + self.updated + self.skipped + self.failures.len() as u32
    }
}

enum StageOutcome {
    Candidate(String, ApplicationCandidate),
    NotAnApplication(String, Verdict),
    Failed(String, String),
}

/// The reconciliation pipeline over injected collaborators.
pub struct SyncRunner {
    source: Arc<dyn MessageSource>,
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn SeenCache>,
    classifier: Classifier,
    extractor: Extractor,
    config: SyncConfig,
}

impl SyncRunner {
    pub fn new(
        source: Arc<dyn MessageSource>,
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            source,
            store,
            cache: Arc::new(NoopCache),
            classifier: Classifier::new(backend.clone()),
            extractor: Extractor::new(backend),
            config: SyncConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SeenCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.classifier = self.classifier.with_retry_policy(retry);
        self.extractor = self.extractor.with_retry_policy(retry);
        self
    }

    /// Run one sync pass dated today.
    pub async fn run(&self) -> Result<SyncReport> {
        self.run_on(Utc::now().date_naive()).await
    }

    /// Run one sync pass with an explicit date for extraction defaults.
    pub async fn run_on(&self, today: NaiveDate) -> Result<SyncReport> {
        let mut seen = self.load_seen();
        let messages = self.fetch_unseen(&seen).await?;
        let mut report = SyncReport::default();

        let outcomes = self.classify_and_extract(messages, today).await;
        for outcome in outcomes {
            self.apply_outcome(outcome, &mut report, &mut seen).await;
        }

        self.save_seen(&seen);
        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failures = report.failures.len(),
            "Sync run complete"
        );
        Ok(report)
    }

    /// Run one sync pass using a single batch extraction call for all
    /// application messages instead of one call each. The model performs
    /// in-batch deduplication; the merge policy still applies per
    /// candidate against the store.
    pub async fn run_batch_on(&self, today: NaiveDate) -> Result<SyncReport> {
        let mut seen = self.load_seen();
        let messages = self.fetch_unseen(&seen).await?;
        let mut report = SyncReport::default();

        let mut applications: Vec<Message> = Vec::new();
        for message in messages {
            match self.classifier.classify(&message).await {
                Verdict::Application => applications.push(message),
                verdict => {
                    info!(message_id = %message.id, verdict = %verdict, "Skipping message");
                    report.skipped += 1;
                    seen.insert(message.id);
                }
            }
        }

        match self.extractor.extract_batch(&applications, today).await {
            Ok(candidates) => {
                for message in &applications {
                    seen.insert(message.id.clone());
                }
                for candidate in candidates {
                    if let Err(e) = self.apply_candidate(&candidate, &mut report).await {
                        report.failures.push(SyncFailure {
                            message_id: "batch".to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                // Leave the batch out of the seen set so the next run
                // retries it.
                warn!(error = %e, "Batch extraction failed");
                for message in &applications {
                    report.failures.push(SyncFailure {
                        message_id: message.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.save_seen(&seen);
        Ok(report)
    }

    fn load_seen(&self) -> HashSet<String> {
        match self.cache.load() {
            Ok(seen) => seen,
            Err(e) => {
                warn!(error = %e, "Seen cache unreadable, reprocessing everything");
                HashSet::new()
            }
        }
    }

    fn save_seen(&self, seen: &HashSet<String>) {
        if let Err(e) = self.cache.save(seen) {
            warn!(error = %e, "Failed to persist seen cache");
        }
    }

    /// List matching ids and fetch the messages not yet seen. A fetch
    /// failure skips that message, not the run.
    async fn fetch_unseen(&self, seen: &HashSet<String>) -> Result<Vec<Message>> {
        let ids = self
            .source
            .list(
                &self.config.query,
                self.config.max_results,
                self.config.newer_than_days,
            )
            .await?;

        let unseen: Vec<String> = ids.into_iter().filter(|id| !seen.contains(id)).collect();
        info!(result_count = unseen.len(), "Fetching unseen messages");

        let mut messages = Vec::with_capacity(unseen.len());
        for id in unseen {
            match self.source.get(&id).await {
                Ok(message) => messages.push(message),
                Err(e) => warn!(message_id = %id, error = %e, "Failed to fetch message"),
            }
        }
        Ok(messages)
    }

    async fn classify_and_extract(
        &self,
        messages: Vec<Message>,
        today: NaiveDate,
    ) -> Vec<StageOutcome> {
        stream::iter(messages)
            .map(|message| async move {
                match self.classifier.classify(&message).await {
                    Verdict::Application => {
                        match self.extractor.extract(&message, today).await {
                            Ok(candidate) => StageOutcome::Candidate(message.id, candidate),
                            Err(e) => StageOutcome::Failed(message.id, e.to_string()),
                        }
                    }
                    verdict => StageOutcome::NotAnApplication(message.id, verdict),
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    async fn apply_outcome(
        &self,
        outcome: StageOutcome,
        report: &mut SyncReport,
        seen: &mut HashSet<String>,
    ) {
        match outcome {
            StageOutcome::Candidate(message_id, candidate) => {
                match self.apply_candidate(&candidate, report).await {
                    Ok(()) => {
                        seen.insert(message_id);
                    }
                    Err(e) => {
                        warn!(message_id = %message_id, error = %e, "Merge failed");
                        report.failures.push(SyncFailure {
                            message_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
            StageOutcome::NotAnApplication(message_id, verdict) => {
                info!(message_id = %message_id, verdict = %verdict, "Skipping message");
                report.skipped += 1;
                seen.insert(message_id);
            }
            StageOutcome::Failed(message_id, error) => {
                warn!(message_id = %message_id, error = %error, "Extraction failed");
                report.failures.push(SyncFailure { message_id, error });
            }
        }
    }

    /// Resolve and merge one candidate. Sequential by design.
    async fn apply_candidate(
        &self,
        candidate: &ApplicationCandidate,
        report: &mut SyncReport,
    ) -> Result<()> {
        match resolve(self.store.as_ref(), candidate).await? {
            Some(existing) => {
                let patch = merge_patch(&existing, candidate)?;
                if patch.is_empty() {
                    info!(
                        record_id = %existing.id,
                        company = %candidate.company,
                        "Candidate already reflected, nothing to do"
                    );
                    report.skipped += 1;
                } else {
                    let record = self.store.update(&existing.id, patch).await?;
                    info!(
                        record_id = %record.id,
                        company = %record.company,
                        status = %record.status,
                        action = %MergeAction::Updated,
                        "Record updated"
                    );
                    report.updated += 1;
                }
            }
            None => {
                let record = self.store.create(draft_from(candidate)?).await?;
                info!(
                    record_id = %record.id,
                    company = %record.company,
                    status = %record.status,
                    action = %MergeAction::Created,
                    "Record created"
                );
                report.created += 1;
            }
        }
        Ok(())
    }
}
