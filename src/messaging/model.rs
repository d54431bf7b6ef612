//! Domain types: roles, the message record, its read state, and projected views.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessagingError;

/// Identifier of a row in `users`.
pub type UserId = i64;
/// Identifier of a row in `messages`.
pub type MessageId = i64;
/// Identifier of a row in `cases`.
pub type CaseId = i64;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Account role of a user of the case-management system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Firm administrator; may message everyone.
    Admin,
    /// Advocate handling cases.
    Advocate,
    /// Client on whose behalf cases are handled.
    Client,
    /// Court or office clerk.
    Clerk,
}

impl Role {
    /// Returns the string representation stored in `users.role`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Advocate => "ADVOCATE",
            Self::Client => "CLIENT",
            Self::Clerk => "CLERK",
        }
    }

    /// Parse a role string, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything that is not one of the four known roles.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "ADVOCATE" => Some(Self::Advocate),
            "CLIENT" => Some(Self::Client),
            "CLERK" => Some(Self::Clerk),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

/// Read state of a message.
///
/// The only transition is `Unread -> Read { at }`; a read message never
/// becomes unread again and its timestamp is never replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Not yet seen by the recipient.
    Unread,
    /// Seen by the recipient at the given instant.
    Read {
        /// When the message was first marked read.
        at: DateTime<Utc>,
    },
}

impl ReadState {
    /// Returns `true` once the message has been read.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns the instant the message was marked read, if any.
    pub fn read_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unread => None,
            Self::Read { at } => Some(*at),
        }
    }

    /// Apply the read transition at `now`.
    ///
    /// Already-read states are returned unchanged.
    #[must_use]
    pub fn mark_read(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::Unread => Self::Read { at: now },
            read @ Self::Read { .. } => read,
        }
    }

    /// Rebuild the state from the `is_read` / `read_at` column pair.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidValue`] if the flag and timestamp
    /// disagree.
    pub fn from_columns(
        is_read: bool,
        read_at: Option<DateTime<Utc>>,
    ) -> Result<Self, MessagingError> {
        match (is_read, read_at) {
            (false, None) => Ok(Self::Unread),
            (true, Some(at)) => Ok(Self::Read { at }),
            (flag, at) => Err(MessagingError::InvalidValue {
                field: "read_at",
                value: format!("is_read={flag} read_at={at:?}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// A directed message as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Row id assigned at insert.
    pub id: MessageId,
    /// Author of the message.
    pub sender_id: UserId,
    /// Addressee of the message.
    pub recipient_id: UserId,
    /// Optional case this message is about.
    pub case_id: Option<CaseId>,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Message body.
    pub text: String,
    /// Creation instant; primary ordering key.
    pub sent_at: DateTime<Utc>,
    /// Current read state.
    pub read_state: ReadState,
}

impl Message {
    /// The participant of this message that is not `viewer`.
    ///
    /// For a message the viewer sent to themselves this is the viewer.
    pub fn counterpart_of(&self, viewer: UserId) -> UserId {
        if self.sender_id == viewer {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

/// A message joined with the display data of its participants and case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// The stored message.
    pub message: Message,
    /// Display name of the sender.
    pub sender_name: String,
    /// Display name of the recipient.
    pub recipient_name: String,
    /// Case number of the tagged case, if any.
    pub case_number: Option<String>,
}

/// A validated message ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Author of the message.
    pub sender_id: UserId,
    /// Addressee of the message.
    pub recipient_id: UserId,
    /// Optional case tag.
    pub case_id: Option<CaseId>,
    /// Optional subject line (never blank).
    pub subject: Option<String>,
    /// Message body (never blank).
    pub text: String,
}

/// Minimal user data needed to render a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role as stored.
    pub role: String,
}

/// Result of marking a single message read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkReadOutcome {
    /// The message was unread and is now read.
    Marked,
    /// The message was already read; nothing changed.
    AlreadyRead,
    /// No message has this id.
    NotFound,
}

impl MarkReadOutcome {
    /// Returns `true` if the message exists.
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// An entry in a user's contact directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// The counterpart's user id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Role as stored.
    pub role: String,
    /// Unread messages from this contact to the viewer.
    pub unread_count: u64,
    /// Preview of the latest message exchanged in either direction.
    pub last_message: Option<String>,
    /// When that message was sent.
    pub last_message_at: Option<DateTime<Utc>>,
}

/// One message inside a two-party thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadMessage {
    /// Message id.
    pub message_id: MessageId,
    /// Author id.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_name: String,
    /// Addressee id.
    pub recipient_id: UserId,
    /// Optional case tag.
    pub case_id: Option<CaseId>,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Full message body.
    pub text: String,
    /// Send instant.
    pub sent_at: DateTime<Utc>,
    /// Read flag after this view's read transition.
    pub read: bool,
}

/// A row in the inbox or sent listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// Message id.
    pub message_id: MessageId,
    /// Case number of the tagged case, if any.
    pub case_number: Option<String>,
    /// Author id.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_name: String,
    /// Addressee id.
    pub recipient_id: UserId,
    /// Addressee display name.
    pub recipient_name: String,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Truncated body.
    pub preview: String,
    /// Current read flag.
    pub read: bool,
    /// Send instant.
    pub sent_at: DateTime<Utc>,
}

/// Full view of a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDetail {
    /// Message id.
    pub message_id: MessageId,
    /// Optional case tag.
    pub case_id: Option<CaseId>,
    /// Case number of the tagged case, if any.
    pub case_number: Option<String>,
    /// Author id.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_name: String,
    /// Addressee id.
    pub recipient_id: UserId,
    /// Addressee display name.
    pub recipient_name: String,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Full message body.
    pub text: String,
    /// Current read flag.
    pub read: bool,
    /// Send instant.
    pub sent_at: DateTime<Utc>,
    /// First-read instant.
    pub read_at: Option<DateTime<Utc>>,
}

impl From<MessageRecord> for MessageDetail {
    fn from(record: MessageRecord) -> Self {
        let MessageRecord {
            message,
            sender_name,
            recipient_name,
            case_number,
        } = record;
        Self {
            message_id: message.id,
            case_id: message.case_id,
            case_number,
            sender_id: message.sender_id,
            sender_name,
            recipient_id: message.recipient_id,
            recipient_name,
            subject: message.subject,
            text: message.text,
            read: message.read_state.is_read(),
            sent_at: message.sent_at,
            read_at: message.read_state.read_at(),
        }
    }
}
