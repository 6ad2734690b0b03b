//! # huntly-core
//!
//! Core types, traits, and abstractions for huntly.
//!
//! This crate provides the data model, error taxonomy, and capability
//! traits that the other huntly crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ExtractionFailure, Result};
pub use models::{
    ApplicationCandidate, ApplicationRecord, ApplicationStatus, MergeAction, Message, RecordDraft,
    RecordPatch, Verdict,
};
pub use text::excerpt;
pub use traits::{GenerationBackend, MessageSource, RecordStore, SeenCache};
