//! Parsing for Gowalla activity timestamps
//!
//! Feed payloads carry RFC 2822 style timestamps with a compact zone offset
//! glued to the seconds ("Sat, 25 Dec 2010 18:21:46+0000"). RFC 2822 wants a
//! space before the offset, so a normalization pass inserts one before
//! handing the string to chrono. Newer payloads use RFC 3339, which is tried
//! first.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// Parse an activity `created_at` value into a UTC timestamp.
///
/// Returns `None` for anything unparseable; the caller decides whether that
/// skips one event or fails a whole page.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    DateTime::parse_from_rfc2822(&normalize_offset(raw))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Insert the missing space before a trailing `+hhmm`/`-hhmm` offset.
///
/// Only rewrites when the string ends in a sign followed by exactly four
/// digits with no whitespace before the sign, so date separators in other
/// formats are left alone.
fn normalize_offset(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    if raw.len() < 6 {
        return Cow::Borrowed(raw);
    }

    let sign_idx = raw.len() - 5;
    let sign = bytes[sign_idx];
    if sign != b'+' && sign != b'-' {
        return Cow::Borrowed(raw);
    }
    if !bytes[sign_idx + 1..].iter().all(u8::is_ascii_digit) {
        return Cow::Borrowed(raw);
    }
    if bytes[sign_idx - 1].is_ascii_whitespace() {
        return Cow::Borrowed(raw);
    }

    let mut normalized = String::with_capacity(raw.len() + 1);
    normalized.push_str(&raw[..sign_idx]);
    normalized.push(' ');
    normalized.push_str(&raw[sign_idx..]);
    Cow::Owned(normalized)
}
