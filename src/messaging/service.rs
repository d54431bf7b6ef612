//! [`MessagingService`]: one handle over the store, settings, and clock.

use std::sync::Arc;

use chrono::Utc;

use super::model::{
    Contact, MarkReadOutcome, MessageDetail, MessageId, MessageSummary, ThreadMessage, UserId,
};
use super::send::SendMessageRequest;
use super::store::MessageStore;
use super::{contacts, mailbox, send, thread, MessagingError};
use crate::config::MessagingConfig;

/// Entry point for the surrounding controller layer.
///
/// Cheap to clone; every call is independent and safe to run concurrently.
/// Timestamps come from the system clock. Use the free functions in the
/// sibling modules to supply `now` explicitly.
#[derive(Clone)]
pub struct MessagingService {
    store: Arc<dyn MessageStore>,
    settings: MessagingConfig,
}

impl std::fmt::Debug for MessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl MessagingService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn MessageStore>, settings: MessagingConfig) -> Self {
        Self { store, settings }
    }

    /// The active messaging settings.
    pub fn settings(&self) -> &MessagingConfig {
        &self.settings
    }

    /// Contacts `user` may message under `role`. See [`contacts::get_contacts`].
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn contacts(&self, user: UserId, role: &str) -> Result<Vec<Contact>, MessagingError> {
        contacts::get_contacts(self.store.as_ref(), user, role, &self.settings).await
    }

    /// Conversation between `user` and `other`; marks incoming messages read.
    /// See [`thread::get_thread`].
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn thread(
        &self,
        user: UserId,
        other: UserId,
    ) -> Result<Vec<ThreadMessage>, MessagingError> {
        thread::get_thread(self.store.as_ref(), user, other, Utc::now()).await
    }

    /// Messages received by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn inbox(&self, user: UserId) -> Result<Vec<MessageSummary>, MessagingError> {
        mailbox::get_inbox(self.store.as_ref(), user, &self.settings).await
    }

    /// Messages sent by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn sent(&self, user: UserId) -> Result<Vec<MessageSummary>, MessagingError> {
        mailbox::get_sent(self.store.as_ref(), user, &self.settings).await
    }

    /// Validate and persist a message. See [`send::send_message`].
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Validation`], [`MessagingError::NotEligible`],
    /// or [`MessagingError::Database`].
    pub async fn send(&self, request: SendMessageRequest) -> Result<MessageId, MessagingError> {
        send::send_message(self.store.as_ref(), request, &self.settings, Utc::now()).await
    }

    /// Mark one message read.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn mark_as_read(&self, id: MessageId) -> Result<MarkReadOutcome, MessagingError> {
        mailbox::mark_as_read(self.store.as_ref(), id, Utc::now()).await
    }

    /// Full detail of one message.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Database`] on store failure.
    pub async fn message(&self, id: MessageId) -> Result<Option<MessageDetail>, MessagingError> {
        mailbox::get_message(self.store.as_ref(), id).await
    }
}
