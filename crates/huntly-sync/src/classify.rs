//! Message classification: rule pass first, generation fallback second.
//!
//! The rule tables are checked in a fixed order (unrelated mail, then
//! application evidence, then job-board noise) against the lowercased
//! subject and the leading slice of the body, each scanned on its own. Only messages no rule
//! matches are sent to the generation service; a failed fallback closes
//! to [`Verdict::Notification`] so an outage never creates records from
//! unvetted mail.

use std::sync::Arc;
use tracing::{debug, warn};

use huntly_core::{defaults, excerpt, GenerationBackend, Message, Verdict};
use huntly_inference::{classification_prompt, with_retry, RetryPolicy};

/// Phrases that mark mail as unrelated to the job search entirely.
/// Checked first: CI noise mentioning "workflow run failed for job ..."
/// must not fall through to the application table.
const OTHER_MARKERS: &[&str] = &[
    "github actions",
    "workflow",
    "run failed",
    "federating",
    "sso",
    "identity provider",
    "newsletter",
    "community update",
];

/// Phrases that only appear in mail about an application the user
/// actually submitted: confirmations, status updates, interview
/// invitations, offers, rejections.
const APPLICATION_MARKERS: &[&str] = &[
    "application received",
    "application submitted",
    "application status",
    "interview",
    "offer",
    "unfortunately",
    "not moving forward",
    "thank you for applying",
    "your application to",
    "application for",
    "progress with other candidates",
    "pursue other candidates",
    "not selected",
    "position has been filled",
    "we regret",
];

/// Phrases typical of job alerts, digests, and recommendations.
const NOTIFICATION_MARKERS: &[&str] = &[
    "job alert",
    "new jobs",
    "job recommendation",
    "might be interested",
    "top matches",
    "jobs match",
    "hiring for",
    "has new",
    "jobs open",
    "be the first to apply",
    "just posted",
    "% match from jobright",
    "jobs like you",
    "job opportunities",
    "recommended for you",
];

/// Classify a message using the rule tables alone.
///
/// Returns `None` when no table matches; the caller decides whether to
/// fall back to the generation service.
pub fn classify_by_rules(message: &Message) -> Option<Verdict> {
    let subject = message.subject.to_lowercase();
    let body = excerpt(&message.body_text, defaults::RULE_SCAN_CHARS).to_lowercase();

    // Subject and body are scanned separately: a marker must appear whole
    // in one of them, never assembled across the boundary.
    let hit = |markers: &[&str]| {
        markers
            .iter()
            .any(|m| subject.contains(m) || body.contains(m))
    };

    if hit(OTHER_MARKERS) {
        return Some(Verdict::Other);
    }
    if hit(APPLICATION_MARKERS) {
        return Some(Verdict::Application);
    }
    if hit(NOTIFICATION_MARKERS) {
        return Some(Verdict::Notification);
    }
    None
}

/// Classifies messages, consulting the generation backend only for
/// messages the rule tables cannot decide.
pub struct Classifier {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
}

impl Classifier {
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

    /// Classify one message. Infallible: any fallback failure, transient
    /// exhaustion, or unparseable model answer yields
    /// [`Verdict::Notification`].
    pub async fn classify(&self, message: &Message) -> Verdict {
        if let Some(verdict) = classify_by_rules(message) {
            debug!(
                message_id = %message.id,
                verdict = %verdict,
                "Classified by rules"
            );
            return verdict;
        }

        let prompt =
            classification_prompt(&message.subject, &message.sender, &message.body_text);
        let answer = with_retry(self.retry, |_| self.backend.generate(&prompt)).await;

        match answer {
            Ok(text) => match text.parse::<Verdict>() {
                Ok(verdict) => {
                    debug!(
                        message_id = %message.id,
                        verdict = %verdict,
                        model = self.backend.model_name(),
                        "Classified by generation fallback"
                    );
                    verdict
                }
                Err(e) => {
                    warn!(
                        message_id = %message.id,
                        error = %e,
                        "Unparseable classification answer, closing to NOTIFICATION"
                    );
                    Verdict::Notification
                }
            },
            Err(e) => {
                warn!(
                    message_id = %message.id,
                    error = %e,
                    "Classification fallback failed, closing to NOTIFICATION"
                );
                Verdict::Notification
            }
        }
    }
}
