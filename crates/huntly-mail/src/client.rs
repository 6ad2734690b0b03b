//! Thin HTTP client for the message source.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use huntly_core::{Error, Message, MessageSource, Result};

use crate::decode::{decode_message, RawMessage};

/// Default message source endpoint (Gmail-compatible REST surface).
pub const DEFAULT_MAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Message source client.
///
/// Authentication is a bearer token supplied at construction; obtaining and
/// refreshing it is outside the pipeline's scope.
pub struct MailClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

impl MailClient {
    pub fn new(base_url: String, token: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        info!(base_url = %base_url, "Initializing mail client");
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Create from environment variables (`MAIL_API_BASE`, `MAIL_API_TOKEN`).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MAIL_API_BASE")
            .unwrap_or_else(|_| DEFAULT_MAIL_API_BASE.to_string());
        let token = std::env::var("MAIL_API_TOKEN")
            .map_err(|_| Error::Config("MAIL_API_TOKEN not set".to_string()))?;
        Ok(Self::new(base_url, token))
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> Error {
        if status.as_u16() == 429 || status.is_server_error() {
            Error::Transient(format!("Mail API returned {}: {}", status, body))
        } else {
            Error::Request(format!("Mail API returned {}: {}", status, body))
        }
    }
}

/// Build the source-side search query, appending the recency window in the
/// source's own `newer_than:<N>d` syntax.
pub fn build_query(query: &str, newer_than_days: Option<u32>) -> String {
    match newer_than_days {
        Some(days) => format!("{} newer_than:{}d", query, days).trim().to_string(),
        None => query.trim().to_string(),
    }
}

#[async_trait]
impl MessageSource for MailClient {
    async fn list(
        &self,
        query: &str,
        max_results: u32,
        newer_than_days: Option<u32>,
    ) -> Result<Vec<String>> {
        let q = build_query(query, newer_than_days);
        debug!(query = %q, max_results, "Listing messages");

        let response = self
            .client
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("q", q.as_str()), ("maxResults", &max_results.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let list: ListResponse = response.json().await?;
        debug!(result_count = list.messages.len(), "Listed messages");
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get(&self, message_id: &str) -> Result<Message> {
        let response = self
            .client
            .get(format!(
                "{}/users/me/messages/{}",
                self.base_url, message_id
            ))
            .bearer_auth(&self.token)
            .query(&[("format", "full")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let raw: RawMessage = response.json().await?;
        Ok(decode_message(&raw))
    }
}
