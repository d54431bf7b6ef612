//! Send operation: validate a request and persist it as an unread message.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::eligibility::{effective_role, eligible_user_ids};
use super::model::{CaseId, MessageId, NewMessage, UserId};
use super::store::MessageStore;
use super::MessagingError;
use crate::config::MessagingConfig;

/// Caller-supplied payload for a new message.
///
/// Fields are optional so that a missing value surfaces as a validation
/// failure rather than a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendMessageRequest {
    /// Author of the message.
    pub sender_id: Option<UserId>,
    /// Addressee of the message.
    pub recipient_id: Option<UserId>,
    /// Message body; must contain a non-whitespace character.
    pub text: Option<String>,
    /// Optional case tag.
    pub case_id: Option<CaseId>,
    /// Optional subject line; blank subjects are dropped.
    pub subject: Option<String>,
}

impl SendMessageRequest {
    /// Check required fields and limits, producing the message to insert.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Validation`] naming every missing field, or
    /// the length violation.
    pub fn validate(self, max_chars: usize) -> Result<NewMessage, MessagingError> {
        let text = self.text.filter(|t| !t.trim().is_empty());

        let mut missing = Vec::new();
        if self.sender_id.is_none() {
            missing.push("sender_id");
        }
        if self.recipient_id.is_none() {
            missing.push("recipient_id");
        }
        if text.is_none() {
            missing.push("text");
        }

        let (Some(sender_id), Some(recipient_id), Some(text)) =
            (self.sender_id, self.recipient_id, text)
        else {
            return Err(MessagingError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let length = text.chars().count();
        if length > max_chars {
            return Err(MessagingError::Validation(format!(
                "text is {length} characters, limit is {max_chars}"
            )));
        }

        Ok(NewMessage {
            sender_id,
            recipient_id,
            case_id: self.case_id,
            subject: self.subject.filter(|s| !s.trim().is_empty()),
            text,
        })
    }
}

/// Check that `recipient` is in `sender`'s contact directory.
async fn ensure_eligible(
    store: &dyn MessageStore,
    message: &NewMessage,
    settings: &MessagingConfig,
) -> Result<(), MessagingError> {
    let not_eligible = || MessagingError::NotEligible {
        sender: message.sender_id,
        recipient: message.recipient_id,
    };

    let stored_role = store
        .user_role(message.sender_id)
        .await?
        .ok_or_else(not_eligible)?;
    let role = effective_role(&stored_role, settings.unknown_role).ok_or_else(not_eligible)?;
    let eligible = eligible_user_ids(store, message.sender_id, role).await?;
    if eligible.contains(&message.recipient_id) {
        Ok(())
    } else {
        Err(not_eligible())
    }
}

/// Validate and persist a new unread message sent at `now`.
///
/// Nothing is written when validation fails. The contact directory governs
/// discovery only; recipients outside it are accepted unless
/// [`MessagingConfig::enforce_send_eligibility`] is set.
///
/// # Errors
///
/// Returns [`MessagingError::Validation`] for bad input,
/// [`MessagingError::NotEligible`] when eligibility is enforced and fails,
/// or [`MessagingError::Database`] on store failure.
pub async fn send_message(
    store: &dyn MessageStore,
    request: SendMessageRequest,
    settings: &MessagingConfig,
    now: DateTime<Utc>,
) -> Result<MessageId, MessagingError> {
    let message = request.validate(settings.max_message_chars)?;
    if settings.enforce_send_eligibility {
        ensure_eligible(store, &message, settings).await?;
    }

    let id = store.insert_message(&message, now).await?;
    info!(
        message_id = id,
        sender_id = message.sender_id,
        recipient_id = message.recipient_id,
        case_id = message.case_id,
        "message sent"
    );
    Ok(id)
}
