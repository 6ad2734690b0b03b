//! End-to-end pipeline runs over scripted collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use huntly_core::{
    ApplicationRecord, ApplicationStatus, Error, Message, MessageSource, Result, SeenCache,
};
use huntly_inference::{MockGenerationBackend, RetryPolicy};
use huntly_store::MemoryStore;
use huntly_sync::{SyncConfig, SyncRunner};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
}

/// Message source backed by a fixed list.
#[derive(Clone, Default)]
struct StaticSource {
    messages: Vec<Message>,
    missing_ids: Vec<String>,
}

impl StaticSource {
    fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            missing_ids: Vec::new(),
        }
    }

    fn with_missing_id(mut self, id: &str) -> Self {
        self.missing_ids.push(id.to_string());
        self
    }
}

#[async_trait]
impl MessageSource for StaticSource {
    async fn list(
        &self,
        _query: &str,
        _max_results: u32,
        _newer_than_days: Option<u32>,
    ) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.messages.iter().map(|m| m.id.clone()).collect();
        ids.extend(self.missing_ids.iter().cloned());
        Ok(ids)
    }

    async fn get(&self, message_id: &str) -> Result<Message> {
        self.messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))
    }
}

/// Seen cache over a shared in-memory set.
#[derive(Clone, Default)]
struct MemoryCache {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl SeenCache for MemoryCache {
    fn load(&self) -> Result<HashSet<String>> {
        Ok(self.seen.lock().unwrap().clone())
    }

    fn save(&self, seen: &HashSet<String>) -> Result<()> {
        *self.seen.lock().unwrap() = seen.clone();
        Ok(())
    }
}

fn message(id: &str, subject: &str, body: &str) -> Message {
    Message {
        id: id.to_string(),
        subject: subject.to_string(),
        sender: "noreply@acme.example".to_string(),
        snippet: String::new(),
        body_text: body.to_string(),
        received_at: None,
    }
}

fn candidate_json(
    company: &str,
    title: &str,
    status: &str,
    date: &str,
    notes: &str,
    external_id: Option<&str>,
) -> String {
    let id_value = match external_id {
        Some(id) => format!("\"{}\"", id),
        None => "null".to_string(),
    };
    format!(
        r#"{{"company": "{}", "job_title": "{}", "status": "{}",
            "application_date": "{}", "deadline": null,
            "notes": "{}", "application_id": {}}}"#,
        company, title, status, date, notes, id_value
    )
}

fn runner(
    source: StaticSource,
    backend: Arc<MockGenerationBackend>,
    store: &MemoryStore,
) -> SyncRunner {
    SyncRunner::new(Arc::new(source), backend, Arc::new(store.clone()))
        .with_retry_policy(RetryPolicy::immediate(2))
        .with_config(SyncConfig {
            concurrency: 2,
            ..SyncConfig::default()
        })
}

#[tokio::test]
async fn confirmation_email_creates_a_record() {
    let source = StaticSource::new(vec![message(
        "m1",
        "Your application to Acme Corp",
        "Thank you for applying to the Platform Engineer role. Reference: REF-12345",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Applied",
            "2025-07-10",
            "Remote role",
            Some("REF-12345"),
        ),
    ));
    let store = MemoryStore::new();

    let report = runner(source, backend, &store).run_on(today()).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 0);
    assert!(report.failures.is_empty());

    let records = store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].company, "Acme Corp");
    assert_eq!(records[0].status, ApplicationStatus::Applied);
    assert_eq!(records[0].external_id.as_deref(), Some("REF-12345"));
}

#[tokio::test]
async fn assessment_email_advances_existing_record() {
    let store = MemoryStore::new();
    store.insert(ApplicationRecord {
        id: "rec-1".to_string(),
        company: "Acme Corp".to_string(),
        job_title: "Platform Engineer".to_string(),
        status: ApplicationStatus::Applied,
        applied_on: NaiveDate::from_ymd_opt(2025, 7, 10).unwrap(),
        notes: "Remote role".to_string(),
        external_id: None,
    });

    let source = StaticSource::new(vec![message(
        "m2",
        "Application status: online assessment at Acme Corp",
        "We'd like you to complete a coding assessment for Platform Engineer.",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Assessment",
            "2025-07-12",
            "Take-home due Friday",
            None,
        ),
    ));

    let report = runner(source, backend, &store).run_on(today()).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 0);

    let record = store.get("rec-1").unwrap();
    assert_eq!(record.status, ApplicationStatus::Assessment);
    assert_eq!(
        record.notes,
        "Remote role\n[Update 2025-07-12] Take-home due Friday"
    );
    // applied_on stays at the earlier date
    assert_eq!(
        record.applied_on,
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    );
}

#[tokio::test]
async fn reprocessing_the_same_message_changes_nothing() {
    let source = StaticSource::new(vec![message(
        "m1",
        "Your application to Acme Corp",
        "Thank you for applying to the Platform Engineer role.",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Applied",
            "2025-07-10",
            "Remote role",
            None,
        ),
    ));
    let store = MemoryStore::new();
    let runner = runner(source, backend, &store);

    let first = runner.run_on(today()).await.unwrap();
    assert_eq!(first.created, 1);
    let after_first = store.all();

    // No seen cache wired in, so the message is fully reprocessed. The
    // merge itself must be the no-op.
    let second = runner.run_on(today()).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(store.all(), after_first);
}

#[tokio::test]
async fn late_confirmation_does_not_regress_status() {
    let store = MemoryStore::new();
    store.insert(ApplicationRecord {
        id: "rec-1".to_string(),
        company: "Acme Corp".to_string(),
        job_title: "Platform Engineer".to_string(),
        status: ApplicationStatus::Interview,
        applied_on: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        notes: String::new(),
        external_id: None,
    });

    let source = StaticSource::new(vec![message(
        "m3",
        "Your application to Acme Corp was received",
        "Thank you for applying.",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Applied",
            "2025-07-01",
            "",
            None,
        ),
    ));

    runner(source, backend, &store).run_on(today()).await.unwrap();
    assert_eq!(
        store.get("rec-1").unwrap().status,
        ApplicationStatus::Interview
    );
}

#[tokio::test]
async fn rejected_record_stays_rejected() {
    let store = MemoryStore::new();
    store.insert(ApplicationRecord {
        id: "rec-1".to_string(),
        company: "Acme Corp".to_string(),
        job_title: "Platform Engineer".to_string(),
        status: ApplicationStatus::Rejected,
        applied_on: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        notes: String::new(),
        external_id: None,
    });

    let source = StaticSource::new(vec![message(
        "m4",
        "Interview invitation from Acme Corp",
        "We'd like to schedule an interview for Platform Engineer.",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Interview",
            "2025-07-14",
            "",
            None,
        ),
    ));

    runner(source, backend, &store).run_on(today()).await.unwrap();
    assert_eq!(
        store.get("rec-1").unwrap().status,
        ApplicationStatus::Rejected
    );
}

#[tokio::test]
async fn external_id_match_wins_over_renamed_company() {
    let store = MemoryStore::new();
    store.insert(ApplicationRecord {
        id: "rec-1".to_string(),
        company: "Acme Corporation".to_string(),
        job_title: "Platform Engineer".to_string(),
        status: ApplicationStatus::Applied,
        applied_on: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        notes: String::new(),
        external_id: Some("REF-12345".to_string()),
    });

    // The new message spells the company differently; the reference id
    // still ties it to the existing record.
    let source = StaticSource::new(vec![message(
        "m5",
        "Acme: interview for Platform Engineer",
        "Interview scheduled. Reference: REF-12345",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme",
            "Platform Engineer",
            "Interview",
            "2025-07-14",
            "",
            Some("REF-12345"),
        ),
    ));

    let report = runner(source, backend, &store).run_on(today()).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 0);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get("rec-1").unwrap().status,
        ApplicationStatus::Interview
    );
}

#[tokio::test]
async fn unrelated_mail_is_skipped_without_a_generation_call() {
    let source = StaticSource::new(vec![
        message(
            "m6",
            "GitHub Actions: workflow run failed",
            "Your deploy workflow run failed.",
        ),
        message(
            "m7",
            "LinkedIn job alert: 10 new jobs for you",
            "Be the first to apply!",
        ),
    ]);
    let backend = Arc::new(MockGenerationBackend::new().with_permanent_failure());
    let store = MemoryStore::new();

    let report = runner(source, backend.clone(), &store)
        .run_on(today())
        .await
        .unwrap();

    assert_eq!(report.skipped, 2);
    assert!(report.failures.is_empty());
    assert!(store.is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn one_bad_message_does_not_stop_the_run() {
    let source = StaticSource::new(vec![
        // Extraction returns prose for this one.
        message(
            "m8",
            "Your application to Broken Inc",
            "Thanks for applying to Broken Inc.",
        ),
        message(
            "m9",
            "Your application to Acme Corp",
            "Thanks for applying to Platform Engineer at Acme Corp.",
        ),
    ])
    // Listed but unfetchable.
    .with_missing_id("m-ghost");

    let backend = Arc::new(
        MockGenerationBackend::new()
            .with_response_for("Broken Inc", "no JSON here, sorry")
            .with_response_for(
                "Acme Corp",
                &candidate_json(
                    "Acme Corp",
                    "Platform Engineer",
                    "Applied",
                    "2025-07-10",
                    "",
                    None,
                ),
            ),
    );
    let store = MemoryStore::new();

    let report = runner(source, backend, &store).run_on(today()).await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].message_id, "m8");
    assert_eq!(store.all()[0].company, "Acme Corp");
}

#[tokio::test]
async fn seen_cache_skips_messages_across_runs() {
    let source = StaticSource::new(vec![message(
        "m1",
        "Your application to Acme Corp",
        "Thanks for applying to Platform Engineer.",
    )]);
    let backend = Arc::new(MockGenerationBackend::new().with_default_response(
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Applied",
            "2025-07-10",
            "",
            None,
        ),
    ));
    let store = MemoryStore::new();
    let cache = MemoryCache::default();
    let runner = runner(source, backend.clone(), &store).with_cache(Arc::new(cache));

    let first = runner.run_on(today()).await.unwrap();
    assert_eq!(first.created, 1);
    let calls_after_first = backend.call_count();

    let second = runner.run_on(today()).await.unwrap();
    assert_eq!(second.processed(), 0);
    assert_eq!(backend.call_count(), calls_after_first);
}

#[tokio::test]
async fn batch_run_deduplicates_through_one_call() {
    let source = StaticSource::new(vec![
        message(
            "m1",
            "Your application to Acme Corp",
            "Thanks for applying to Platform Engineer.",
        ),
        message(
            "m2",
            "Acme Corp interview",
            "Interview scheduled for Platform Engineer.",
        ),
        message(
            "m6",
            "GitHub Actions: workflow run failed",
            "Your deploy workflow run failed.",
        ),
    ]);
    // One array response for the whole batch: the model already folded
    // the two Acme messages together.
    let batch_payload = format!(
        "[{}]",
        candidate_json(
            "Acme Corp",
            "Platform Engineer",
            "Interview",
            "2025-07-10",
            "Interview scheduled",
            None,
        )
    );
    let backend =
        Arc::new(MockGenerationBackend::new().with_default_response(batch_payload));
    let store = MemoryStore::new();

    let report = runner(source, backend.clone(), &store)
        .run_batch_on(today())
        .await
        .unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1); // the CI message
    assert_eq!(store.len(), 1);
    assert_eq!(store.all()[0].status, ApplicationStatus::Interview);
    // Both application messages went through a single generation call.
    assert_eq!(backend.call_count(), 1);
}
