//! Shared formatting helpers: previews and storage timestamps.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::MessagingError;

/// Marker appended to a preview that was cut short.
pub const ELLIPSIS: char = '…';

/// Timestamp layout used in the `messages` table.
///
/// Fixed-width UTC with microseconds, so lexical order is chronological order.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Truncate `text` to at most `max_chars` characters, appending [`ELLIPSIS`]
/// when anything was removed.
///
/// Counts Unicode scalar values, never splitting a character.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((cut, _)) => {
            let mut preview = String::with_capacity(cut.saturating_add(ELLIPSIS.len_utf8()));
            preview.push_str(&text[..cut]);
            preview.push(ELLIPSIS);
            preview
        }
    }
}

/// Render an instant in [`STORAGE_FORMAT`].
pub fn to_storage(at: DateTime<Utc>) -> String {
    at.format(STORAGE_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts values with or without fractional seconds, since rows written by
/// SQLite's own `datetime('now')` have none.
///
/// # Errors
///
/// Returns [`MessagingError::InvalidValue`] if the text is not a timestamp.
pub fn parse_storage(field: &'static str, raw: &str) -> Result<DateTime<Utc>, MessagingError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| MessagingError::InvalidValue {
            field,
            value: raw.to_owned(),
        })
}

/// Parse an optional stored timestamp.
///
/// # Errors
///
/// Returns [`MessagingError::InvalidValue`] if a present value is malformed.
pub fn parse_storage_opt(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, MessagingError> {
    raw.map(|value| parse_storage(field, value)).transpose()
}
