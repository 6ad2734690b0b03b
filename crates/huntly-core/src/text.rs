//! Small text helpers shared by the prompt builders and decoders.

/// First `max_chars` characters of `s`, on a char boundary.
///
/// The truncation limits in [`crate::defaults`] are character counts, so a
/// byte slice would panic on multi-byte input.
pub fn excerpt(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
