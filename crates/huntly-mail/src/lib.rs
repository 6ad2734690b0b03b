//! # huntly-mail
//!
//! Message source collaborator for huntly.
//!
//! This crate provides:
//! - Gmail-style raw message decoding (plain-text preference, HTML-strip
//!   fallback, base64url bodies)
//! - A thin HTTP [`MailClient`] implementing
//!   [`MessageSource`](huntly_core::MessageSource)

pub mod client;
pub mod decode;

pub use client::{build_query, MailClient, DEFAULT_MAIL_API_BASE};
pub use decode::{clean_html, decode_message, extract_text, MessagePart, RawMessage};
