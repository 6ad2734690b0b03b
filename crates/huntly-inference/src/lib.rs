//! # huntly-inference
//!
//! Generation-service collaborator for huntly.
//!
//! This crate provides:
//! - Pluggable [`GenerationBackend`](huntly_core::GenerationBackend) over
//!   the OpenRouter (OpenAI-compatible) chat completions API
//! - Bounded retry with incremental backoff for transient failures
//! - Prompt builders for classification and extraction
//! - A scripted mock backend (feature `mock`) for deterministic tests
//!
//! # Feature Flags
//!
//! - `mock`: Enable the mock backend

pub mod openrouter;
pub mod prompts;
pub mod retry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use openrouter::{OpenRouterBackend, OpenRouterConfig};
pub use prompts::{batch_extraction_prompt, classification_prompt, extraction_prompt};
pub use retry::{with_retry, RetryPolicy};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerationBackend;
