//! Thread engine: full two-party history with read-on-view.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::model::{MessageRecord, ThreadMessage, UserId};
use super::store::MessageStore;
use super::MessagingError;

fn thread_message(record: MessageRecord) -> ThreadMessage {
    let MessageRecord {
        message,
        sender_name,
        ..
    } = record;
    ThreadMessage {
        message_id: message.id,
        sender_id: message.sender_id,
        sender_name,
        recipient_id: message.recipient_id,
        case_id: message.case_id,
        subject: message.subject,
        text: message.text,
        sent_at: message.sent_at,
        read: message.read_state.is_read(),
    }
}

/// Return the conversation between `viewer` and `other`, oldest first.
///
/// Before reading, every unread message `other` sent to `viewer` is marked
/// read at `now`, so the returned thread already reflects the transition.
/// Messages the viewer sent are never touched. Calling this again with no
/// new messages returns the same list and leaves every `read_at` unchanged.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn get_thread(
    store: &dyn MessageStore,
    viewer: UserId,
    other: UserId,
    now: DateTime<Utc>,
) -> Result<Vec<ThreadMessage>, MessagingError> {
    let marked = store.mark_thread_read(other, viewer, now).await?;
    if marked > 0 {
        debug!(viewer, other, marked, "thread messages marked read");
    }

    let mut records = store.thread_between(viewer, other).await?;
    records.sort_by_key(|r| (r.message.sent_at, r.message.id));
    Ok(records.into_iter().map(thread_message).collect())
}
