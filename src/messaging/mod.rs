//! Messaging module: contact directory, conversation threads, mailbox views, and send.
//!
//! # Store Access Pattern
//!
//! Every operation is a short request-per-call against a [`MessageStore`].
//! There is no in-process state and no writer actor: the only writes are a
//! single-row insert (send) and single-statement read transitions, so the
//! atomicity SQLite gives one statement is all the coordination needed.
//!
//! Each operation exists as a free function taking the store and an explicit
//! `now`, and as a method on [`MessagingService`] which supplies the clock.

pub mod contacts;
pub mod eligibility;
pub mod format;
pub mod mailbox;
pub mod model;
pub mod send;
pub mod service;
pub mod sqlite;
pub mod store;
pub mod thread;

pub use self::model::{
    CaseId, Contact, MarkReadOutcome, Message, MessageDetail, MessageId, MessageRecord,
    MessageSummary, NewMessage, ReadState, Role, ThreadMessage, UserId, UserSummary,
};
pub use self::send::SendMessageRequest;
pub use self::service::MessagingService;
pub use self::sqlite::SqliteMessageStore;
pub use self::store::MessageStore;

/// Errors from the messaging subsystem.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Send input was rejected before touching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The recipient is not in the sender's contact directory.
    #[error("user {recipient} is not an eligible contact of user {sender}")]
    NotEligible {
        /// The sending user.
        sender: UserId,
        /// The rejected recipient.
        recipient: UserId,
    },

    /// A stored value could not be decoded.
    #[error("invalid {field} value: {value:?}")]
    InvalidValue {
        /// Which column contained the bad value.
        field: &'static str,
        /// The unexpected value.
        value: String,
    },
}
