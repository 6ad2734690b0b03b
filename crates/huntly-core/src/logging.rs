//! Structured logging field name constants for huntly.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, merge outcomes, run summaries |
//! | DEBUG | Decision points (rule hits, tier matches), config choices |
//! | TRACE | Per-item iteration, raw prompt/response excerpts |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "mail", "inference", "store", "sync"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "classify", "extract", "resolve", "merge", "openrouter"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "classify", "extract", "run", "find_by_company"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Message id being processed.
pub const MESSAGE_ID: &str = "message_id";

/// Store-assigned record id.
pub const RECORD_ID: &str = "record_id";

/// Company on the candidate or record.
pub const COMPANY: &str = "company";

/// Job title on the candidate or record.
pub const JOB_TITLE: &str = "job_title";

/// Application status value.
pub const STATUS: &str = "status";

/// Classification verdict.
pub const VERDICT: &str = "verdict";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

/// Number of items handled by a batch operation.
pub const RESULT_COUNT: &str = "result_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
