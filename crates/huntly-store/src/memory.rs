//! In-memory record store for tests and offline runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

use huntly_core::{
    ApplicationRecord, Error, RecordDraft, RecordPatch, RecordStore, Result,
};

use crate::CompanyMatch;

/// In-memory [`RecordStore`] with the same observable semantics as the
/// Notion store. Cloning shares the underlying records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    company_match: CompanyMatch,
}

#[derive(Default)]
struct Inner {
    records: Vec<ApplicationRecord>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company_match(mut self, company_match: CompanyMatch) -> Self {
        self.company_match = company_match;
        self
    }

    /// Seed a record directly, bypassing the pipeline.
    pub fn insert(&self, record: ApplicationRecord) {
        self.inner.lock().unwrap().records.push(record);
    }

    pub fn get(&self, record_id: &str) -> Option<ApplicationRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<ApplicationRecord> {
        self.inner.lock().unwrap().records.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ApplicationRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_by_company(&self, company: &str) -> Result<Vec<ApplicationRecord>> {
        let inner = self.inner.lock().unwrap();
        let matches: Vec<ApplicationRecord> = inner
            .records
            .iter()
            .filter(|r| match self.company_match {
                CompanyMatch::Exact => r.company == company,
                CompanyMatch::Contains => r.company.contains(company),
            })
            .cloned()
            .collect();
        debug!(company, result_count = matches.len(), "Company query complete");
        Ok(matches)
    }

    async fn create(&self, draft: RecordDraft) -> Result<ApplicationRecord> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let record = ApplicationRecord {
            id: format!("rec-{}", inner.next_id),
            company: draft.company,
            job_title: draft.job_title,
            status: draft.status,
            applied_on: draft.applied_on,
            notes: draft.notes,
            external_id: draft.external_id,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record_id: &str, patch: RecordPatch) -> Result<ApplicationRecord> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| Error::NotFound(format!("record {}", record_id)))?;

        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(applied_on) = patch.applied_on {
            record.applied_on = applied_on;
        }
        if let Some(notes) = patch.notes {
            record.notes = notes;
        }
        if let Some(external_id) = patch.external_id {
            record.external_id = Some(external_id);
        }
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use huntly_core::ApplicationStatus;

    fn draft(company: &str, title: &str) -> RecordDraft {
        RecordDraft {
            company: company.to_string(),
            job_title: title.to_string(),
            status: ApplicationStatus::Applied,
            applied_on: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            notes: String::new(),
            external_id: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create(draft("Acme", "Engineer")).await.unwrap();
        let b = store.create(draft("Initech", "Analyst")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn find_by_external_id_is_exact() {
        let store = MemoryStore::new();
        let mut d = draft("Acme", "Engineer");
        d.external_id = Some("REF-12345".to_string());
        store.create(d).await.unwrap();

        assert!(store
            .find_by_external_id("REF-12345")
            .await
            .unwrap()
            .is_some());
        assert!(store.find_by_external_id("REF-123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn company_match_modes() {
        let exact = MemoryStore::new();
        exact.create(draft("Acme Corp", "Engineer")).await.unwrap();
        assert!(exact.find_by_company("Acme").await.unwrap().is_empty());
        assert_eq!(exact.find_by_company("Acme Corp").await.unwrap().len(), 1);

        let contains = MemoryStore::new().with_company_match(CompanyMatch::Contains);
        contains.create(draft("Acme Corp", "Engineer")).await.unwrap();
        assert_eq!(contains.find_by_company("Acme").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_applies_only_set_fields() {
        let store = MemoryStore::new();
        let created = store.create(draft("Acme", "Engineer")).await.unwrap();

        let updated = store
            .update(
                &created.id,
                RecordPatch {
                    status: Some(ApplicationStatus::Offer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Offer);
        assert_eq!(updated.company, "Acme");
        assert_eq!(updated.applied_on, created.applied_on);
    }

    #[tokio::test]
    async fn update_missing_record_errors() {
        let store = MemoryStore::new();
        let err = store
            .update("rec-999", RecordPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
