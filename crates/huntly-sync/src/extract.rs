//! Structured extraction of application candidates from classified mail.
//!
//! Model output is decoded strictly: the payload must be JSON with the
//! agreed keys, the status must be one of the five lifecycle states, and
//! company and job title must be non-empty. Anything else is an
//! [`ExtractionFailure`] recorded against the message, never a partial
//! candidate.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use huntly_core::{
    ApplicationCandidate, ApplicationStatus, Error, ExtractionFailure, GenerationBackend,
    Message, Result,
};
use huntly_inference::{batch_extraction_prompt, extraction_prompt, with_retry, RetryPolicy};

/// Raw payload shape the model is asked to return. All fields optional
/// so validation, not deserialization, decides what is missing.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    company: Option<String>,
    job_title: Option<String>,
    status: Option<String>,
    application_date: Option<String>,
    deadline: Option<String>,
    notes: Option<String>,
    application_id: Option<String>,
}

/// Strip a surrounding markdown code fence, with or without a language
/// tag. Models add these despite instructions not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    non_empty(value).and_then(|s| {
        if s.eq_ignore_ascii_case("null") {
            return None;
        }
        NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
    })
}

fn validate(raw: RawCandidate, today: NaiveDate) -> Result<ApplicationCandidate> {
    let company =
        non_empty(raw.company).ok_or(ExtractionFailure::MissingField("company"))?;
    let job_title =
        non_empty(raw.job_title).ok_or(ExtractionFailure::MissingField("job_title"))?;

    let status_text = non_empty(raw.status).unwrap_or_else(|| "Applied".to_string());
    let status: ApplicationStatus = status_text
        .parse()
        .map_err(|_| ExtractionFailure::InvalidStatus(status_text))?;

    Ok(ApplicationCandidate {
        company,
        job_title,
        status,
        applied_on: parse_date(raw.application_date).unwrap_or(today),
        deadline: parse_date(raw.deadline),
        notes: non_empty(raw.notes).unwrap_or_default(),
        external_id: non_empty(raw.application_id),
    })
}

/// Decode one model payload into a validated candidate.
pub fn parse_candidate(payload: &str, today: NaiveDate) -> Result<ApplicationCandidate> {
    let stripped = strip_code_fences(payload);
    let raw: RawCandidate = serde_json::from_str(stripped)
        .map_err(|e| ExtractionFailure::MalformedPayload(e.to_string()))?;
    validate(raw, today)
}

/// Decode a batch payload (JSON array) into validated candidates.
///
/// Individual entries that fail validation are dropped with a warning;
/// a malformed array fails the whole batch.
pub fn parse_candidate_batch(
    payload: &str,
    today: NaiveDate,
) -> Result<Vec<ApplicationCandidate>> {
    let stripped = strip_code_fences(payload);
    let raws: Vec<RawCandidate> = serde_json::from_str(stripped)
        .map_err(|e| ExtractionFailure::MalformedPayload(e.to_string()))?;

    let mut candidates = Vec::with_capacity(raws.len());
    for raw in raws {
        match validate(raw, today) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!(error = %e, "Dropping invalid batch entry"),
        }
    }
    Ok(candidates)
}

/// Extracts structured candidates through the generation backend.
pub struct Extractor {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
}

impl Extractor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Extract a candidate from one application message.
    ///
    /// The prompt instructs the model to name the employer rather than
    /// the job board; that instruction is the only guard, the extractor
    /// does not verify it against the sender.
    pub async fn extract(
        &self,
        message: &Message,
        today: NaiveDate,
    ) -> Result<ApplicationCandidate> {
        let prompt = extraction_prompt(&message.body_text, today);
        let payload = with_retry(self.retry, |_| self.backend.generate(&prompt))
            .await
            .map_err(|e| Error::Extraction(ExtractionFailure::Service(e.to_string())))?;

        let candidate = parse_candidate(&payload, today)?;
        debug!(
            message_id = %message.id,
            company = %candidate.company,
            job_title = %candidate.job_title,
            status = %candidate.status,
            "Extracted candidate"
        );
        Ok(candidate)
    }

    /// Extract deduplicated candidates from a batch of application
    /// messages in a single generation call.
    pub async fn extract_batch(
        &self,
        messages: &[Message],
        today: NaiveDate,
    ) -> Result<Vec<ApplicationCandidate>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = batch_extraction_prompt(messages, today);
        let payload = with_retry(self.retry, |_| self.backend.generate(&prompt))
            .await
            .map_err(|e| Error::Extraction(ExtractionFailure::Service(e.to_string())))?;

        let candidates = parse_candidate_batch(&payload, today)?;
        debug!(
            message_count = messages.len(),
            result_count = candidates.len(),
            "Extracted candidate batch"
        );
        Ok(candidates)
    }
}
