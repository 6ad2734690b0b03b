//! Mock generation backend for deterministic testing.
//!
//! Failures are scripted, not sampled: `with_transient_failures(n)` makes
//! the next `n` calls fail with a retryable error, which is what the retry
//! and fail-closed paths need to be exercised deterministically.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use huntly_core::{Error, GenerationBackend, Result};

#[derive(Default)]
struct Inner {
    default_response: String,
    /// First substring key found in the prompt wins.
    mappings: Vec<(String, String)>,
    transient_failures: u32,
    always_fail: bool,
    calls: Vec<String>,
}

/// Scripted mock backend implementing [`GenerationBackend`].
#[derive(Clone, Default)]
pub struct MockGenerationBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned when no mapping matches.
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        self.inner.lock().unwrap().default_response = response.into();
        self
    }

    /// Respond with `output` whenever the prompt contains `needle`.
    ///
    /// Prompts embed message bodies, so substring matching is how a test
    /// targets one message's classification or extraction.
    pub fn with_response_for(self, needle: impl Into<String>, output: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Fail the next `n` calls with a transient error, then behave normally.
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.inner.lock().unwrap().transient_failures = n;
        self
    }

    /// Fail every call with a permanent error.
    pub fn with_permanent_failure(self) -> Self {
        self.inner.lock().unwrap().always_fail = true;
        self
    }

    /// All prompts seen so far.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(prompt.to_string());

        if inner.always_fail {
            return Err(Error::Inference("scripted permanent failure".to_string()));
        }
        if inner.transient_failures > 0 {
            inner.transient_failures -= 1;
            return Err(Error::Transient("scripted transient failure".to_string()));
        }

        for (needle, output) in &inner.mappings {
            if prompt.contains(needle.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(inner.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_when_no_mapping() {
        let backend = MockGenerationBackend::new().with_default_response("NOTIFICATION");
        assert_eq!(backend.generate("anything").await.unwrap(), "NOTIFICATION");
    }

    #[tokio::test]
    async fn substring_mapping_wins() {
        let backend = MockGenerationBackend::new()
            .with_default_response("OTHER")
            .with_response_for("Acme Corp", "APPLICATION");
        assert_eq!(
            backend.generate("subject: Acme Corp news").await.unwrap(),
            "APPLICATION"
        );
        assert_eq!(backend.generate("unrelated").await.unwrap(), "OTHER");
    }

    #[tokio::test]
    async fn transient_failures_are_consumed() {
        let backend = MockGenerationBackend::new()
            .with_default_response("ok")
            .with_transient_failures(2);
        assert!(backend.generate("a").await.unwrap_err().is_transient());
        assert!(backend.generate("b").await.unwrap_err().is_transient());
        assert_eq!(backend.generate("c").await.unwrap(), "ok");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_never_recovers() {
        let backend = MockGenerationBackend::new().with_permanent_failure();
        assert!(!backend.generate("a").await.unwrap_err().is_transient());
        assert!(!backend.generate("b").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn call_log_records_prompts() {
        let backend = MockGenerationBackend::new().with_default_response("x");
        backend.generate("first prompt").await.unwrap();
        backend.generate("second prompt").await.unwrap();
        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "first prompt");
    }
}
