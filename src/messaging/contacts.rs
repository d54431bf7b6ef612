//! Contact directory: who a viewer may message, with conversation summaries.

use std::cmp::Ordering;

use tracing::{debug, trace};

use super::eligibility::{effective_role, eligible_user_ids};
use super::format::truncate_preview;
use super::model::{Contact, UserId};
use super::store::MessageStore;
use super::MessagingError;
use crate::config::MessagingConfig;

/// Directory order: most recent conversation first, contacts without any
/// history last, then by name, then by id.
pub fn directory_order(a: &Contact, b: &Contact) -> Ordering {
    // `None < Some`, so comparing b to a sorts newest first and `None` last.
    b.last_message_at
        .cmp(&a.last_message_at)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// List the contacts `viewer` may converse with under `role`.
///
/// Each contact carries the number of unread messages it sent the viewer and
/// a preview of the latest message exchanged in either direction. Users with
/// no message history are still listed. A viewer that is unknown or inactive
/// gets an empty directory. Read-only.
///
/// # Errors
///
/// Returns [`MessagingError::Database`] on store failure.
pub async fn get_contacts(
    store: &dyn MessageStore,
    viewer: UserId,
    role: &str,
    settings: &MessagingConfig,
) -> Result<Vec<Contact>, MessagingError> {
    let Some(role) = effective_role(role, settings.unknown_role) else {
        return Ok(Vec::new());
    };

    let eligible = eligible_user_ids(store, viewer, role).await?;
    if eligible.is_empty() {
        debug!(viewer, %role, "no eligible contacts");
        return Ok(Vec::new());
    }

    let ids: Vec<UserId> = eligible.into_iter().collect();
    let users = store.users_by_ids(&ids).await?;
    let unread = store.unread_counts_by_sender(viewer).await?;
    let mut latest = store.latest_message_per_counterpart(viewer).await?;

    let mut contacts: Vec<Contact> = users
        .into_iter()
        .map(|user| {
            let last = latest.remove(&user.id);
            Contact {
                user_id: user.id,
                name: user.name,
                role: user.role,
                unread_count: unread.get(&user.id).copied().unwrap_or(0),
                last_message: last
                    .as_ref()
                    .map(|m| truncate_preview(&m.text, settings.contact_preview_chars)),
                last_message_at: last.map(|m| m.sent_at),
            }
        })
        .collect();
    contacts.sort_by(directory_order);

    trace!(viewer, %role, count = contacts.len(), "contacts resolved");
    Ok(contacts)
}
