//! # huntly-sync
//!
//! The reconciliation pipeline: classify inbound mail, extract structured
//! application candidates, resolve them against the record store, and
//! merge under the forward-progress policy.
//!
//! Collaborators (message source, generation backend, record store, seen
//! cache) are injected as trait objects; see [`SyncRunner`].

pub mod cache;
pub mod classify;
pub mod extract;
pub mod merge;
pub mod resolve;
pub mod runner;

pub use cache::{JsonFileCache, NoopCache};
pub use classify::{classify_by_rules, Classifier};
pub use extract::{parse_candidate, parse_candidate_batch, strip_code_fences, Extractor};
pub use merge::{draft_from, merge_patch};
pub use resolve::resolve;
pub use runner::{SyncConfig, SyncFailure, SyncReport, SyncRunner};
