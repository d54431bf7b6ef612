//! Tests for `src/messaging/service.rs`.

use std::sync::Arc;

use casemail::config::MessagingConfig;
use casemail::messaging::{
    MarkReadOutcome, MessageStore, MessagingError, MessagingService, SendMessageRequest,
};

use crate::fixtures::*;

async fn service_with(settings: MessagingConfig) -> MessagingService {
    let store: Arc<dyn MessageStore> = Arc::new(setup_firm().await);
    MessagingService::new(store, settings)
}

fn request(from: i64, to: i64, text: &str) -> SendMessageRequest {
    SendMessageRequest {
        sender_id: Some(from),
        recipient_id: Some(to),
        text: Some(text.to_owned()),
        ..SendMessageRequest::default()
    }
}

#[tokio::test]
async fn service_round_trip_through_every_operation() {
    let service = service_with(MessagingConfig::default()).await;

    let id = service
        .send(request(DEVI_ADVOCATE, CARA_CLIENT, "Court date confirmed"))
        .await
        .expect("send should succeed");

    let inbox = service.inbox(CARA_CLIENT).await.expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message_id, id);
    assert!(!inbox[0].read);

    let sent = service.sent(DEVI_ADVOCATE).await.expect("sent");
    assert_eq!(sent[0].message_id, id);

    let contacts = service.contacts(CARA_CLIENT, "CLIENT").await.expect("contacts");
    let devi = contacts
        .iter()
        .find(|c| c.user_id == DEVI_ADVOCATE)
        .expect("advocate listed");
    assert_eq!(devi.unread_count, 1);

    let thread = service.thread(CARA_CLIENT, DEVI_ADVOCATE).await.expect("thread");
    assert_eq!(thread.len(), 1);
    assert!(thread[0].read);

    let detail = service
        .message(id)
        .await
        .expect("lookup")
        .expect("message exists");
    assert!(detail.read);
    assert!(detail.read_at.is_some());

    let outcome = service.mark_as_read(id).await.expect("mark");
    assert_eq!(outcome, MarkReadOutcome::AlreadyRead);
}

#[tokio::test]
async fn service_applies_its_settings() {
    let service = service_with(MessagingConfig {
        enforce_send_eligibility: true,
        ..MessagingConfig::default()
    })
    .await;

    assert!(service.settings().enforce_send_eligibility);
    let err = service
        .send(request(CARA_CLIENT, COLM_CLIENT, "hi"))
        .await
        .expect_err("clients cannot message other clients");
    assert!(matches!(err, MessagingError::NotEligible { .. }));
}

#[tokio::test]
async fn concurrent_sends_all_land() {
    let service = service_with(MessagingConfig::default()).await;
    let (a, b) = (service.clone(), service.clone());

    let (first, second, third) = tokio::join!(
        a.send(request(DEVI_ADVOCATE, ASHA_ADMIN, "one")),
        b.send(request(KIT_CLERK, ASHA_ADMIN, "two")),
        service.send(request(CARA_CLIENT, ASHA_ADMIN, "three")),
    );
    let mut ids = vec![
        first.expect("send"),
        second.expect("send"),
        third.expect("send"),
    ];
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    let inbox = service.inbox(ASHA_ADMIN).await.expect("inbox");
    assert_eq!(inbox.len(), 3);
}

#[tokio::test]
async fn concurrent_read_marking_is_consistent() {
    let service = service_with(MessagingConfig::default()).await;
    let id = service
        .send(request(DEVI_ADVOCATE, ASHA_ADMIN, "race"))
        .await
        .expect("send should succeed");
    let other = service.clone();

    let (by_id, thread) = tokio::join!(
        service.mark_as_read(id),
        other.thread(ASHA_ADMIN, DEVI_ADVOCATE),
    );

    let outcome = by_id.expect("mark");
    assert!(outcome.is_found());
    let thread = thread.expect("thread");
    assert!(thread[0].read);

    let contacts = service.contacts(ASHA_ADMIN, "ADMIN").await.expect("contacts");
    let devi = contacts
        .iter()
        .find(|c| c.user_id == DEVI_ADVOCATE)
        .expect("advocate listed");
    assert_eq!(devi.unread_count, 0);
}

#[test]
fn service_is_shareable_across_tasks() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MessagingService>();
}
