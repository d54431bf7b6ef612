//! Tests for `src/messaging/send.rs` against a real store.

use casemail::config::{MessagingConfig, UnknownRolePolicy};
use casemail::messaging::mailbox::get_message;
use casemail::messaging::send::send_message;
use casemail::messaging::{MessagingError, SendMessageRequest, UserId};

use crate::fixtures::*;

fn request(from: UserId, to: UserId, text: &str) -> SendMessageRequest {
    SendMessageRequest {
        sender_id: Some(from),
        recipient_id: Some(to),
        text: Some(text.to_owned()),
        case_id: None,
        subject: None,
    }
}

fn enforcing() -> MessagingConfig {
    MessagingConfig {
        enforce_send_eligibility: true,
        ..MessagingConfig::default()
    }
}

#[tokio::test]
async fn sent_message_is_stored_unread_with_send_time() {
    let store = setup_firm().await;

    let id = send_message(
        &store,
        request(ASHA_ADMIN, DEVI_ADVOCATE, "Welcome aboard"),
        &MessagingConfig::default(),
        at(12),
    )
    .await
    .expect("send should succeed");

    let detail = get_message(&store, id)
        .await
        .expect("lookup")
        .expect("message exists");
    assert_eq!(detail.sender_id, ASHA_ADMIN);
    assert_eq!(detail.recipient_id, DEVI_ADVOCATE);
    assert_eq!(detail.text, "Welcome aboard");
    assert_eq!(detail.sent_at, at(12));
    assert!(!detail.read);
    assert_eq!(detail.read_at, None);
}

#[tokio::test]
async fn message_ids_increase() {
    let store = setup_firm().await;

    let first = send_at(&store, ASHA_ADMIN, KIT_CLERK, "one", 1).await;
    let second = send_at(&store, KIT_CLERK, ASHA_ADMIN, "two", 1).await;

    assert!(second > first);
}

#[tokio::test]
async fn invalid_requests_leave_store_unchanged() {
    let store = setup_firm().await;
    send_at(&store, ASHA_ADMIN, KIT_CLERK, "existing", 1).await;
    let settings = MessagingConfig::default();
    let too_long = "w".repeat(settings.max_message_chars.saturating_add(1));

    let bad_requests = [
        SendMessageRequest::default(),
        SendMessageRequest {
            sender_id: None,
            ..request(ASHA_ADMIN, KIT_CLERK, "no sender")
        },
        SendMessageRequest {
            recipient_id: None,
            ..request(ASHA_ADMIN, KIT_CLERK, "no recipient")
        },
        request(ASHA_ADMIN, KIT_CLERK, ""),
        request(ASHA_ADMIN, KIT_CLERK, "  \t "),
        request(ASHA_ADMIN, KIT_CLERK, &too_long),
    ];

    for bad in bad_requests {
        let err = send_message(&store, bad, &settings, at(2))
            .await
            .expect_err("request should be rejected");
        assert!(matches!(err, MessagingError::Validation(_)), "got {err:?}");
    }

    assert_eq!(message_count(&store).await, 1);
}

#[tokio::test]
async fn text_at_the_limit_is_accepted() {
    let store = setup_firm().await;
    let settings = MessagingConfig {
        max_message_chars: 12,
        ..MessagingConfig::default()
    };

    send_message(
        &store,
        request(ASHA_ADMIN, KIT_CLERK, "twelve chars"),
        &settings,
        at(1),
    )
    .await
    .expect("send should succeed");

    assert_eq!(message_count(&store).await, 1);
}

#[tokio::test]
async fn eligibility_is_not_checked_by_default() {
    let store = setup_firm().await;

    // Eli is not on any of Cara's cases.
    send_message(
        &store,
        request(CARA_CLIENT, ELI_ADVOCATE, "Are you my advocate?"),
        &MessagingConfig::default(),
        at(1),
    )
    .await
    .expect("send should succeed");

    assert_eq!(message_count(&store).await, 1);
}

#[tokio::test]
async fn enforced_eligibility_rejects_recipients_outside_directory() {
    let store = setup_firm().await;

    let err = send_message(
        &store,
        request(CARA_CLIENT, ELI_ADVOCATE, "Are you my advocate?"),
        &enforcing(),
        at(1),
    )
    .await
    .expect_err("recipient is not a contact");

    assert!(matches!(
        err,
        MessagingError::NotEligible {
            sender: CARA_CLIENT,
            recipient: ELI_ADVOCATE
        }
    ));
    assert_eq!(message_count(&store).await, 0);
}

#[tokio::test]
async fn enforced_eligibility_accepts_directory_contacts() {
    let store = setup_firm().await;

    send_message(
        &store,
        request(CARA_CLIENT, DEVI_ADVOCATE, "Question about my case"),
        &enforcing(),
        at(1),
    )
    .await
    .expect("advocate on the client's case is a contact");

    assert_eq!(message_count(&store).await, 1);
}

#[tokio::test]
async fn enforced_eligibility_rejects_unknown_sender() {
    let store = setup_firm().await;

    let err = send_message(
        &store,
        request(424_242, ASHA_ADMIN, "hello"),
        &enforcing(),
        at(1),
    )
    .await
    .expect_err("sender does not exist");

    assert!(matches!(err, MessagingError::NotEligible { .. }));
    assert_eq!(message_count(&store).await, 0);
}

#[tokio::test]
async fn enforced_eligibility_rejects_inactive_sender() {
    let store = setup_firm().await;

    let err = send_message(
        &store,
        request(IVY_INACTIVE_ADMIN, ASHA_ADMIN, "still here?"),
        &enforcing(),
        at(1),
    )
    .await
    .expect_err("inactive sender has no contacts");

    assert!(matches!(
        err,
        MessagingError::NotEligible {
            sender: IVY_INACTIVE_ADMIN,
            recipient: ASHA_ADMIN
        }
    ));
    assert_eq!(message_count(&store).await, 0);
}

#[tokio::test]
async fn enforced_eligibility_follows_unknown_role_policy() {
    let store = setup_firm().await;
    add_user(&store, 1040, "Jo Janitor", "JANITOR", "ACTIVE").await;

    send_message(
        &store,
        request(1040, KIT_CLERK, "fail-open"),
        &enforcing(),
        at(1),
    )
    .await
    .expect("unknown role falls back to the admin rule");

    let deny = MessagingConfig {
        unknown_role: UnknownRolePolicy::Deny,
        ..enforcing()
    };
    let err = send_message(&store, request(1040, KIT_CLERK, "denied"), &deny, at(2))
        .await
        .expect_err("unknown role is denied");

    assert!(matches!(err, MessagingError::NotEligible { .. }));
    assert_eq!(message_count(&store).await, 1);
}

#[tokio::test]
async fn blank_subject_is_stored_as_absent() {
    let store = setup_firm().await;
    let req = SendMessageRequest {
        subject: Some("   ".to_owned()),
        ..request(ASHA_ADMIN, KIT_CLERK, "body")
    };

    let id = send_message(&store, req, &MessagingConfig::default(), at(1))
        .await
        .expect("send should succeed");

    let detail = get_message(&store, id)
        .await
        .expect("lookup")
        .expect("message exists");
    assert_eq!(detail.subject, None);
}
