//! Merge policy: how a candidate folds into an existing record.
//!
//! Pure functions over in-memory values; the runner applies the resulting
//! patch to the store. Re-merging the same candidate into the record it
//! produced yields an empty patch, which is what makes reprocessing a
//! message harmless.

use chrono::NaiveDate;
use tracing::debug;

use huntly_core::{
    ApplicationCandidate, ApplicationRecord, Error, RecordDraft, RecordPatch, Result,
};

/// Merge preconditions. The extractor already enforces these; the check
/// repeats here so a hand-built candidate cannot corrupt a record.
fn validate(candidate: &ApplicationCandidate) -> Result<()> {
    if candidate.company.trim().is_empty() {
        return Err(Error::Validation("candidate has empty company".to_string()));
    }
    if candidate.job_title.trim().is_empty() {
        return Err(Error::Validation(
            "candidate has empty job title".to_string(),
        ));
    }
    Ok(())
}

/// Build the creation draft for a candidate with no existing record.
pub fn draft_from(candidate: &ApplicationCandidate) -> Result<RecordDraft> {
    validate(candidate)?;
    Ok(RecordDraft {
        company: candidate.company.clone(),
        job_title: candidate.job_title.clone(),
        status: candidate.status,
        applied_on: candidate.applied_on,
        notes: candidate.notes.clone(),
        external_id: candidate.external_id.clone(),
    })
}

/// Whether the candidate's status should replace the record's.
///
/// A terminal record never changes. A terminal candidate always wins.
/// Otherwise the status only moves forward in the progression order;
/// an out-of-order confirmation email cannot demote a record.
fn status_advances(existing: &ApplicationRecord, candidate: &ApplicationCandidate) -> bool {
    if existing.status.is_terminal() {
        return false;
    }
    if candidate.status.is_terminal() {
        return true;
    }
    candidate.status.rank() > existing.status.rank()
}

/// Notes line appended when a later message adds context to a record.
fn update_line(applied_on: NaiveDate, note: &str) -> String {
    format!("[Update {}] {}", applied_on.format("%Y-%m-%d"), note)
}

/// Compute the patch that folds `candidate` into `existing`.
///
/// The patch carries only fields that actually change; an identical
/// candidate produces an empty patch.
pub fn merge_patch(
    existing: &ApplicationRecord,
    candidate: &ApplicationCandidate,
) -> Result<RecordPatch> {
    validate(candidate)?;

    let mut patch = RecordPatch::default();

    if status_advances(existing, candidate) {
        patch.status = Some(candidate.status);
    }

    // Earliest application date wins; only a strictly earlier date moves it.
    if candidate.applied_on < existing.applied_on {
        patch.applied_on = Some(candidate.applied_on);
    }

    // Notes are append-only. The substring check is what keeps a reprocessed
    // message from stacking duplicate update lines.
    let note = candidate.notes.trim();
    if !note.is_empty() && !existing.notes.contains(note) {
        let line = update_line(candidate.applied_on, note);
        let combined = if existing.notes.is_empty() {
            line
        } else {
            format!("{}\n{}", existing.notes, line)
        };
        patch.notes = Some(combined);
    }

    // External id is write-once.
    if existing.external_id.is_none() {
        if let Some(ref external_id) = candidate.external_id {
            patch.external_id = Some(external_id.clone());
        }
    }

    if !patch.is_empty() {
        debug!(
            record_id = %existing.id,
            company = %existing.company,
            status_change = patch.status.is_some(),
            "Merge produced a patch"
        );
    }
    Ok(patch)
}
