//! Storage boundary consumed by the messaging core.
//!
//! The [`MessageStore`] trait abstracts over the relational store holding
//! `users`, `clients`, `advocates`, `cases`, and `messages`. The default
//! implementation is [`SqliteMessageStore`](super::SqliteMessageStore).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{
    MarkReadOutcome, Message, MessageId, MessageRecord, NewMessage, Role, UserId, UserSummary,
};
use super::MessagingError;

/// Parameterised queries and the two write paths the messaging core needs.
///
/// Relationship queries (`active_*`, `*_for_*_cases`) only ever return users
/// whose account status is active. All implementations must be `Send + Sync`
/// to allow shared use across async task boundaries.
#[async_trait]
pub trait MessageStore: Send + Sync {
    // -- relationships ------------------------------------------------------

    /// Ids of all active users holding `role`.
    async fn active_user_ids_with_role(&self, role: Role) -> Result<Vec<UserId>, MessagingError>;

    /// Ids of all active users.
    async fn active_user_ids(&self) -> Result<Vec<UserId>, MessagingError>;

    /// Active advocate users assigned to any case whose client is `client`.
    async fn advocate_ids_for_client_cases(
        &self,
        client: UserId,
    ) -> Result<Vec<UserId>, MessagingError>;

    /// Active client users of any case handled by `advocate`.
    async fn client_ids_for_advocate_cases(
        &self,
        advocate: UserId,
    ) -> Result<Vec<UserId>, MessagingError>;

    /// Display data for the given users, in no particular order.
    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, MessagingError>;

    /// The stored role string of a user, or `None` if the user does not exist.
    async fn user_role(&self, user: UserId) -> Result<Option<String>, MessagingError>;

    /// Whether `user` exists and has an active account.
    async fn is_active_user(&self, user: UserId) -> Result<bool, MessagingError>;

    // -- message lookups ----------------------------------------------------

    /// Unread messages addressed to `viewer`, counted per sender.
    async fn unread_counts_by_sender(
        &self,
        viewer: UserId,
    ) -> Result<HashMap<UserId, u64>, MessagingError>;

    /// The latest message exchanged with each counterpart of `viewer`, in
    /// either direction, keyed by counterpart id.
    async fn latest_message_per_counterpart(
        &self,
        viewer: UserId,
    ) -> Result<HashMap<UserId, Message>, MessagingError>;

    /// Every message between `a` and `b`, in either orientation.
    async fn thread_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<MessageRecord>, MessagingError>;

    /// Every message addressed to `user`.
    async fn received_by(&self, user: UserId) -> Result<Vec<MessageRecord>, MessagingError>;

    /// Every message authored by `user`.
    async fn sent_by(&self, user: UserId) -> Result<Vec<MessageRecord>, MessagingError>;

    /// A single message with its display data.
    async fn message_record(
        &self,
        id: MessageId,
    ) -> Result<Option<MessageRecord>, MessagingError>;

    // -- writes -------------------------------------------------------------

    /// Insert an unread message sent at `sent_at` and return its id.
    async fn insert_message(
        &self,
        message: &NewMessage,
        sent_at: DateTime<Utc>,
    ) -> Result<MessageId, MessagingError>;

    /// Mark one message read at `at` unless it already is.
    async fn mark_read_by_id(
        &self,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<MarkReadOutcome, MessagingError>;

    /// Mark every unread message from `sender` to `recipient` read at `at`.
    ///
    /// Returns the number of messages transitioned.
    async fn mark_thread_read(
        &self,
        sender: UserId,
        recipient: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, MessagingError>;
}
