//! Centralized default values shared across crates.

/// Default OpenRouter API endpoint.
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default generation model slug.
pub const GEN_MODEL: &str = "mistralai/mistral-small-3.2-24b-instruct:free";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Bounded attempt count for transient-failure retries.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base delay between retries (seconds); grows incrementally per attempt.
pub const RETRY_BASE_DELAY_SECS: u64 = 10;

/// Body window scanned by the deterministic classification rules.
pub const RULE_SCAN_CHARS: usize = 500;

/// Subject/sender/body excerpts handed to the classification fallback.
pub const CLASSIFY_SUBJECT_CHARS: usize = 200;
pub const CLASSIFY_SENDER_CHARS: usize = 100;
pub const CLASSIFY_BODY_CHARS: usize = 1000;

/// Body excerpt handed to single-message extraction.
pub const EXTRACT_BODY_CHARS: usize = 3000;

/// Per-message body excerpt in batch extraction.
pub const BATCH_BODY_CHARS: usize = 2000;

/// Cap on decoded message body length.
pub const BODY_CAP_CHARS: usize = 50_000;

/// Default page size for message listing.
pub const LIST_MAX_RESULTS: u32 = 20;
