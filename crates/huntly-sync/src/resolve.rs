//! Two-tier identity resolution of a candidate against the record store.
//!
//! Tier 1 is an exact external-id lookup and always wins when the
//! candidate carries one. Tier 2 queries by company (under the store's
//! equality policy) and filters by exact job title in memory, because the
//! store cannot filter on two properties in one query.

use tracing::{debug, warn};

use huntly_core::{ApplicationCandidate, ApplicationRecord, RecordStore, Result};

/// Find the existing record this candidate refers to, if any.
pub async fn resolve(
    store: &dyn RecordStore,
    candidate: &ApplicationCandidate,
) -> Result<Option<ApplicationRecord>> {
    if let Some(ref external_id) = candidate.external_id {
        if let Some(record) = store.find_by_external_id(external_id).await? {
            debug!(
                record_id = %record.id,
                external_id = %external_id,
                "Resolved by external id"
            );
            return Ok(Some(record));
        }
    }

    let by_company = store.find_by_company(&candidate.company).await?;
    let mut matches = by_company
        .into_iter()
        .filter(|r| r.job_title == candidate.job_title);

    let first = matches.next();
    if let Some(ref record) = first {
        if matches.next().is_some() {
            warn!(
                company = %candidate.company,
                job_title = %candidate.job_title,
                record_id = %record.id,
                "Multiple records match company and title; using the first"
            );
        }
        debug!(
            record_id = %record.id,
            company = %candidate.company,
            "Resolved by company and title"
        );
    }
    Ok(first)
}
