//! Data model for the reconciliation pipeline.
//!
//! A [`Message`] is decoded mail from the message source; an
//! [`ApplicationCandidate`] is the structured extraction from one message
//! (or one entry of a batch extraction); an [`ApplicationRecord`] is the
//! persisted unit of truth in the record store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A decoded inbound message. Immutable; never persisted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque, unique id assigned by the message source.
    pub id: String,
    pub subject: String,
    pub sender: String,
    /// Source-provided preview line.
    pub snippet: String,
    /// Best-effort plain text body (HTML-stripped when no plain part exists).
    pub body_text: String,
    /// Parsed Date header, when present and well-formed.
    pub received_at: Option<DateTime<Utc>>,
}

/// Classification verdict for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Evidence of an application the user actually submitted.
    Application,
    /// Job alert, digest, recommendation.
    Notification,
    /// Unrelated mail (CI notifications, SSO updates, newsletters).
    Other,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Application => write!(f, "APPLICATION"),
            Self::Notification => write!(f, "NOTIFICATION"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

impl FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "APPLICATION" => Ok(Self::Application),
            "NOTIFICATION" => Ok(Self::Notification),
            "OTHER" => Ok(Self::Other),
            other => Err(Error::Inference(format!(
                "Unrecognized classification label: {}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Application status
// ---------------------------------------------------------------------------

/// Lifecycle status of an application.
///
/// Non-terminal states form the total order
/// `Applied < Assessment < Interview < Offer`. `Rejected` is terminal:
/// reachable from any state, never overwritten once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Assessment,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    /// Position in the progression order. `Rejected` ranks above all
    /// non-terminal states so a plain rank comparison never demotes it.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Applied => 0,
            Self::Assessment => 1,
            Self::Interview => 2,
            Self::Offer => 3,
            Self::Rejected => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// All five states, in progression order.
    pub fn all() -> [ApplicationStatus; 5] {
        [
            Self::Applied,
            Self::Assessment,
            Self::Interview,
            Self::Offer,
            Self::Rejected,
        ]
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "Applied"),
            Self::Assessment => write!(f, "Assessment"),
            Self::Interview => write!(f, "Interview"),
            Self::Offer => write!(f, "Offer"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Applied" => Ok(Self::Applied),
            "Assessment" => Ok(Self::Assessment),
            "Interview" => Ok(Self::Interview),
            "Offer" => Ok(Self::Offer),
            "Rejected" => Ok(Self::Rejected),
            other => Err(Error::Validation(format!("Unknown status: {}", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates and records
// ---------------------------------------------------------------------------

/// Structured extraction result from a single message, not yet merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCandidate {
    pub company: String,
    pub job_title: String,
    pub status: ApplicationStatus,
    pub applied_on: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub notes: String,
    /// Application/job reference id quoted in the message, when present.
    pub external_id: Option<String>,
}

/// A persisted application record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Store-assigned id. Opaque and immutable.
    pub id: String,
    pub company: String,
    pub job_title: String,
    pub status: ApplicationStatus,
    pub applied_on: NaiveDate,
    /// Append-only note history.
    pub notes: String,
    /// Stable once set; never overwritten.
    pub external_id: Option<String>,
}

/// Fields written when creating a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub company: String,
    pub job_title: String,
    pub status: ApplicationStatus,
    pub applied_on: NaiveDate,
    pub notes: String,
    pub external_id: Option<String>,
}

/// Partial update for an existing record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub status: Option<ApplicationStatus>,
    pub applied_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub external_id: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.applied_on.is_none()
            && self.notes.is_none()
            && self.external_id.is_none()
    }
}

/// What a merge did against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    Created,
    Updated,
}

impl std::fmt::Display for MergeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}
