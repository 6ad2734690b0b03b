//! Capability traits at the pipeline's seams.
//!
//! The three external collaborators (generation service, record store,
//! message source) are injected as trait objects so the pipeline can be
//! exercised against deterministic test doubles.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::{ApplicationRecord, Message, RecordDraft, RecordPatch};

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    ///
    /// Transient failures (rate limit, timeout) surface as
    /// [`Error::Transient`](crate::Error::Transient) so callers can retry.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Remote record store holding [`ApplicationRecord`]s.
///
/// The pipeline only ever issues the four operations below; filter and
/// persistence mechanics belong to the implementation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Exact lookup by external application id.
    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<ApplicationRecord>>;

    /// All records whose company matches under the store's equality
    /// semantics. Title filtering happens in-memory at the caller.
    async fn find_by_company(&self, company: &str) -> Result<Vec<ApplicationRecord>>;

    /// Create a new record; the store assigns the id.
    async fn create(&self, draft: RecordDraft) -> Result<ApplicationRecord>;

    /// Apply a partial update to an existing record.
    async fn update(&self, record_id: &str, patch: RecordPatch) -> Result<ApplicationRecord>;
}

/// Source of raw inbound messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// List message ids matching a query within a recency window.
    async fn list(
        &self,
        query: &str,
        max_results: u32,
        newer_than_days: Option<u32>,
    ) -> Result<Vec<String>>;

    /// Fetch and decode a single message.
    async fn get(&self, message_id: &str) -> Result<Message>;
}

/// Persistence for the set of already-processed message ids.
///
/// Re-runs over overlapping time windows skip messages recorded here. The
/// merge itself is idempotent, so the cache is an optimization, not a
/// correctness requirement.
pub trait SeenCache: Send + Sync {
    fn load(&self) -> Result<HashSet<String>>;
    fn save(&self, seen: &HashSet<String>) -> Result<()>;
}
