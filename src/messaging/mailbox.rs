//! Inbox and sent listings, single-message detail, and explicit read marking.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::format::truncate_preview;
use super::model::{
    MarkReadOutcome, MessageDetail, MessageId, MessageRecord, MessageSummary, UserId,
};
use super::store::MessageStore;
use super::MessagingError;
use crate::config::MessagingConfig;

fn summarize(record: MessageRecord, preview_chars: usize) -> MessageSummary {
    let MessageRecord {
        message,
        sender_name,
        recipient_name,
        case_number,
    } = record;
    MessageSummary {
        message_id: message.id,
        case_number,
        sender_id: message.sender_id,
        sender_name,
        recipient_id: message.recipient_id,
        recipient_name,
        subject: message.subject,
        preview: truncate_preview(&message.text, preview_chars),
        read: message.read_state.is_read(),
        sent_at: message.sent_at,
    }
}

fn newest_first(mut records: Vec<MessageRecord>, preview_chars: usize) -> Vec<MessageSummary> {
    records.sort_by_key(|r| Reverse((r.message.sent_at, r.message.id)));
    records
        .into_iter()
        .map(|r| summarize(r, preview_chars))
        .collect()
}

/// Every message addressed to `user`, newest first. Read-only.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn get_inbox(
    store: &dyn MessageStore,
    user: UserId,
    settings: &MessagingConfig,
) -> Result<Vec<MessageSummary>, MessagingError> {
    let records = store.received_by(user).await?;
    Ok(newest_first(records, settings.list_preview_chars))
}

/// Every message authored by `user`, newest first. Read-only.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn get_sent(
    store: &dyn MessageStore,
    user: UserId,
    settings: &MessagingConfig,
) -> Result<Vec<MessageSummary>, MessagingError> {
    let records = store.sent_by(user).await?;
    Ok(newest_first(records, settings.list_preview_chars))
}

/// Mark a single message read at `now`.
///
/// Idempotent: an already-read message keeps its original `read_at`. No
/// identity check is made; callers decide who may mark what.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn mark_as_read(
    store: &dyn MessageStore,
    message_id: MessageId,
    now: DateTime<Utc>,
) -> Result<MarkReadOutcome, MessagingError> {
    let outcome = store.mark_read_by_id(message_id, now).await?;
    debug!(message_id, ?outcome, "mark as read");
    Ok(outcome)
}

/// Full detail of one message, or `None` if it does not exist. Read-only.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn get_message(
    store: &dyn MessageStore,
    message_id: MessageId,
) -> Result<Option<MessageDetail>, MessagingError> {
    Ok(store
        .message_record(message_id)
        .await?
        .map(MessageDetail::from))
}
