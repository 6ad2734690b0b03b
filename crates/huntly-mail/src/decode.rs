//! Decoding raw multipart messages into [`Message`]s.
//!
//! The message source returns Gmail-style JSON: a part tree with base64url
//! bodies and a flat header list. Decoding prefers `text/plain` parts and
//! falls back to HTML with tags, styles, and scripts stripped.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use huntly_core::{defaults, excerpt, Message};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A raw message as returned by the source's `get` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    pub payload: Option<MessagePart>,
}

/// One node of the MIME part tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(default, rename = "mimeType")]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn decode_body(body: &PartBody) -> String {
    let Some(data) = body.data.as_deref() else {
        return String::new();
    };
    // The source pads inconsistently; accept both forms.
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip HTML down to readable text: styles, scripts, comments, and tags
/// removed, common entities decoded, whitespace collapsed.
pub fn clean_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = STYLE_RE.replace_all(html, "");
    let text = SCRIPT_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Best-effort plain text from a MIME part tree.
///
/// Multipart messages collect every `text/plain` leaf first; only when none
/// exists are the `text/html` leaves stripped and joined.
pub fn extract_text(payload: &MessagePart) -> String {
    if payload.parts.is_empty() {
        if payload.mime_type.contains("text/plain") {
            return decode_body(&payload.body);
        }
        if payload.mime_type.contains("text/html") {
            return clean_html(&decode_body(&payload.body));
        }
        return String::new();
    }

    let mut text_chunks = Vec::new();
    let mut html_chunks = Vec::new();
    let mut stack = vec![payload];
    while let Some(part) = stack.pop() {
        if !part.parts.is_empty() {
            // Push in reverse so siblings pop in document order.
            stack.extend(part.parts.iter().rev());
            continue;
        }
        if part.mime_type.contains("text/plain") {
            text_chunks.push(decode_body(&part.body));
        } else if part.mime_type.contains("text/html") {
            html_chunks.push(decode_body(&part.body));
        }
    }

    if !text_chunks.is_empty() {
        return text_chunks.join("\n");
    }
    if !html_chunks.is_empty() {
        return clean_html(&html_chunks.join("\n"));
    }
    String::new()
}

fn header_value<'a>(payload: &'a MessagePart, name: &str) -> Option<&'a str> {
    payload
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decode a raw message into the pipeline's [`Message`].
pub fn decode_message(raw: &RawMessage) -> Message {
    let payload = raw.payload.clone().unwrap_or_default();
    let body_text = extract_text(&payload);
    Message {
        id: raw.id.clone(),
        subject: header_value(&payload, "Subject").unwrap_or_default().to_string(),
        sender: header_value(&payload, "From").unwrap_or_default().to_string(),
        snippet: raw.snippet.clone(),
        body_text: excerpt(&body_text, defaults::BODY_CAP_CHARS).to_string(),
        received_at: header_value(&payload, "Date").and_then(parse_date),
    }
}
