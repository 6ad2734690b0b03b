//! # huntly-store
//!
//! Record store collaborator for huntly.
//!
//! This crate provides:
//! - [`NotionStore`]: a [`RecordStore`](huntly_core::RecordStore) over the
//!   Notion database HTTP API
//! - [`MemoryStore`]: an in-memory store with the same observable semantics,
//!   for tests and offline runs
//! - [`CompanyMatch`]: the company-name equality policy used by tier-2
//!   identity lookups

pub mod memory;
pub mod notion;

pub use memory::MemoryStore;
pub use notion::{NotionStore, DEFAULT_NOTION_API_BASE};

/// How company names are compared when looking up existing records.
///
/// Extracted company names drift between messages ("Acme" vs "Acme Corp"),
/// so substring matching can be enabled deliberately. Exact matching is the
/// default because substring matching conflates distinct companies that
/// share a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompanyMatch {
    #[default]
    Exact,
    Contains,
}

impl CompanyMatch {
    /// Filter operator name used by the Notion rich-text query filter.
    pub fn filter_operator(&self) -> &'static str {
        match self {
            CompanyMatch::Exact => "equals",
            CompanyMatch::Contains => "contains",
        }
    }
}
