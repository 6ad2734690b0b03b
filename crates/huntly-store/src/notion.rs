//! Notion-backed record store.
//!
//! Records live as pages in a Notion database with these properties:
//! `Title` (title), `Company`, `Job Title`, `Notes`, `Application ID`
//! (rich text), `Status` (status), `Applied On` (date). The store issues
//! only the four operations the pipeline needs: two filtered queries,
//! create, and update.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use huntly_core::{
    ApplicationRecord, ApplicationStatus, Error, RecordDraft, RecordPatch, RecordStore, Result,
};

use crate::CompanyMatch;

/// Default Notion API endpoint.
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";

const NOTION_VERSION: &str = "2022-06-28";

/// Record store over the Notion pages API.
pub struct NotionStore {
    client: Client,
    base_url: String,
    token: String,
    database_id: String,
    company_match: CompanyMatch,
}

impl NotionStore {
    pub fn new(base_url: String, token: String, database_id: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        info!(base_url = %base_url, database_id = %database_id, "Initializing Notion store");
        Self {
            client,
            base_url,
            token,
            database_id,
            company_match: CompanyMatch::Exact,
        }
    }

    /// Create from environment variables (`NOTION_TOKEN`,
    /// `NOTION_DATABASE_ID`, optional `NOTION_API_BASE`).
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("NOTION_TOKEN")
            .map_err(|_| Error::Config("NOTION_TOKEN not set".to_string()))?;
        let database_id = std::env::var("NOTION_DATABASE_ID")
            .map_err(|_| Error::Config("NOTION_DATABASE_ID not set".to_string()))?;
        let base_url = std::env::var("NOTION_API_BASE")
            .unwrap_or_else(|_| DEFAULT_NOTION_API_BASE.to_string());
        Ok(Self::new(base_url, token, database_id))
    }

    /// Choose the store-side company equality semantics.
    pub fn with_company_match(mut self, company_match: CompanyMatch) -> Self {
        self.company_match = company_match;
        self
    }

    async fn query(&self, filter: Value) -> Result<Vec<Value>> {
        let response = self
            .client
            .post(format!(
                "{}/databases/{}/query",
                self.base_url, self.database_id
            ))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "filter": filter }))
            .send()
            .await?;

        let body = Self::check(response).await?;
        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    async fn check(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(Error::Transient(format!(
                    "Store returned {}: {}",
                    status, body
                )))
            } else {
                Err(Error::Store(format!("Store returned {}: {}", status, body)))
            };
        }
        response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Failed to parse store response: {}", e)))
    }
}

// ---------------------------------------------------------------------------
// Property mapping
// ---------------------------------------------------------------------------

fn rich_text_prop(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn draft_properties(draft: &RecordDraft) -> Value {
    let mut props = json!({
        "Title": { "title": [{ "text": { "content": format!("{} - {}", draft.company, draft.job_title) } }] },
        "Company": rich_text_prop(&draft.company),
        "Job Title": rich_text_prop(&draft.job_title),
        "Status": { "status": { "name": draft.status.to_string() } },
        "Applied On": { "date": { "start": draft.applied_on.format("%Y-%m-%d").to_string() } },
        "Notes": rich_text_prop(&draft.notes),
    });
    if let Some(external_id) = &draft.external_id {
        props["Application ID"] = rich_text_prop(external_id);
    }
    props
}

fn patch_properties(patch: &RecordPatch) -> Value {
    let mut props = json!({});
    if let Some(status) = patch.status {
        props["Status"] = json!({ "status": { "name": status.to_string() } });
    }
    if let Some(applied_on) = patch.applied_on {
        props["Applied On"] = json!({ "date": { "start": applied_on.format("%Y-%m-%d").to_string() } });
    }
    if let Some(notes) = &patch.notes {
        props["Notes"] = rich_text_prop(notes);
    }
    if let Some(external_id) = &patch.external_id {
        props["Application ID"] = rich_text_prop(external_id);
    }
    props
}

fn rich_text_value(props: &Value, name: &str) -> String {
    props
        .get(name)
        .and_then(|p| p.get("rich_text"))
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|t| t.pointer("/text/content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Decode a page into an [`ApplicationRecord`].
///
/// Status and date are strict: a page with a status outside the five-state
/// enum or an unparseable `Applied On` is surfaced as a store error rather
/// than silently coerced.
fn parse_page(page: &Value) -> Result<ApplicationRecord> {
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Store("Page missing id".to_string()))?
        .to_string();
    let props = page
        .get("properties")
        .ok_or_else(|| Error::Store(format!("Page {} missing properties", id)))?;

    let status_name = props
        .pointer("/Status/status/name")
        .and_then(Value::as_str)
        .unwrap_or("Applied");
    let status = ApplicationStatus::from_str(status_name)
        .map_err(|_| Error::Store(format!("Page {} has unknown status {}", id, status_name)))?;

    let date_str = props
        .pointer("/Applied On/date/start")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Store(format!("Page {} missing Applied On", id)))?;
    // Date properties may carry a time suffix; the date part is enough.
    let date_part = date_str.get(..10).unwrap_or(date_str);
    let applied_on = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| Error::Store(format!("Page {} has bad Applied On: {}", id, e)))?;

    let external_id = {
        let v = rich_text_value(props, "Application ID");
        (!v.is_empty()).then_some(v)
    };

    Ok(ApplicationRecord {
        id,
        company: rich_text_value(props, "Company"),
        job_title: rich_text_value(props, "Job Title"),
        status,
        applied_on,
        notes: rich_text_value(props, "Notes"),
        external_id,
    })
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ApplicationRecord>> {
        // Identifier lookups are always exact, regardless of company mode.
        let results = self
            .query(json!({
                "property": "Application ID",
                "rich_text": { "equals": external_id }
            }))
            .await?;

        if results.len() > 1 {
            warn!(
                external_id,
                result_count = results.len(),
                "Multiple records share an external id; using the first"
            );
        }
        results.first().map(parse_page).transpose()
    }

    async fn find_by_company(&self, company: &str) -> Result<Vec<ApplicationRecord>> {
        let operator = self.company_match.filter_operator();
        let results = self
            .query(json!({
                "property": "Company",
                "rich_text": { operator: company }
            }))
            .await?;

        debug!(company, result_count = results.len(), "Company query complete");
        results.iter().map(parse_page).collect()
    }

    async fn create(&self, draft: RecordDraft) -> Result<ApplicationRecord> {
        let response = self
            .client
            .post(format!("{}/pages", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({
                "parent": { "database_id": self.database_id },
                "properties": draft_properties(&draft),
            }))
            .send()
            .await?;

        let page = Self::check(response).await?;
        parse_page(&page)
    }

    async fn update(&self, record_id: &str, patch: RecordPatch) -> Result<ApplicationRecord> {
        let response = self
            .client
            .patch(format!("{}/pages/{}", self.base_url, record_id))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "properties": patch_properties(&patch) }))
            .send()
            .await?;

        let page = Self::check(response).await?;
        parse_page(&page)
    }
}
