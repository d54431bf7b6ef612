//! Shared seeding helpers for messaging tests.
//!
//! The firm seeded by [`seed_firm`]:
//!
//! | user | name           | role     | status   | link                          |
//! |------|----------------|----------|----------|-------------------------------|
//! | 1001 | Asha Admin     | ADMIN    | ACTIVE   |                               |
//! | 1004 | Devi Advocate  | ADVOCATE | ACTIVE   | advocate 1, case CIV-001      |
//! | 1005 | Eli Advocate   | ADVOCATE | ACTIVE   | advocate 2, case CRIM-002     |
//! | 1006 | Cara Client    | CLIENT   | ACTIVE   | client 1, cases CIV-001/003   |
//! | 1007 | Colm Client    | CLIENT   | ACTIVE   | client 2, case CRIM-002       |
//! | 1008 | Kit Clerk      | CLERK    | ACTIVE   |                               |
//! | 1009 | Ivy Admin      | ADMIN    | INACTIVE |                               |
//! | 1010 | Omar Advocate  | ADVOCATE | INACTIVE | advocate 3, case CIV-003      |

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use casemail::config::MessagingConfig;
use casemail::messaging::send::send_message;
use casemail::messaging::{MessageId, SendMessageRequest, SqliteMessageStore, UserId};

pub const ASHA_ADMIN: UserId = 1001;
pub const DEVI_ADVOCATE: UserId = 1004;
pub const ELI_ADVOCATE: UserId = 1005;
pub const CARA_CLIENT: UserId = 1006;
pub const COLM_CLIENT: UserId = 1007;
pub const KIT_CLERK: UserId = 1008;
pub const IVY_INACTIVE_ADMIN: UserId = 1009;
pub const OMAR_INACTIVE_ADVOCATE: UserId = 1010;

/// Case tagged in tests: CIV-2025-001 between Cara and Devi.
pub const CIVIL_CASE: i64 = 1;

pub async fn setup_store() -> SqliteMessageStore {
    let pool = casemail::db::open_in_memory()
        .await
        .expect("in-memory database should open");
    SqliteMessageStore::new(pool)
}

pub async fn setup_firm() -> SqliteMessageStore {
    let store = setup_store().await;
    seed_firm(&store).await;
    store
}

pub async fn add_user(store: &SqliteMessageStore, id: UserId, name: &str, role: &str, status: &str) {
    sqlx::query("INSERT INTO users (user_id, email, name, role, status) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(id)
        .bind(format!("user{id}@firm.test"))
        .bind(name)
        .bind(role)
        .bind(status)
        .execute(store.pool())
        .await
        .expect("user insert should succeed");
}

/// Insert `count` active clients with ids `first_id..first_id + count`.
pub async fn add_bulk_clients(store: &SqliteMessageStore, first_id: UserId, count: i64) {
    sqlx::query(
        "WITH RECURSIVE seq(n) AS (SELECT 0 UNION ALL SELECT n + 1 FROM seq WHERE n + 1 < ?2) \
         INSERT INTO users (user_id, email, name, role, status) \
         SELECT ?1 + n, 'bulk' || (?1 + n) || '@firm.test', 'Bulk Client ' || n, 'CLIENT', 'ACTIVE' \
         FROM seq",
    )
    .bind(first_id)
    .bind(count)
    .execute(store.pool())
    .await
    .expect("bulk user insert should succeed");
}

pub async fn seed_firm(store: &SqliteMessageStore) {
    add_user(store, ASHA_ADMIN, "Asha Admin", "ADMIN", "ACTIVE").await;
    add_user(store, DEVI_ADVOCATE, "Devi Advocate", "ADVOCATE", "ACTIVE").await;
    add_user(store, ELI_ADVOCATE, "Eli Advocate", "ADVOCATE", "ACTIVE").await;
    add_user(store, CARA_CLIENT, "Cara Client", "CLIENT", "ACTIVE").await;
    add_user(store, COLM_CLIENT, "Colm Client", "CLIENT", "ACTIVE").await;
    add_user(store, KIT_CLERK, "Kit Clerk", "CLERK", "ACTIVE").await;
    add_user(store, IVY_INACTIVE_ADMIN, "Ivy Admin", "ADMIN", "INACTIVE").await;
    add_user(store, OMAR_INACTIVE_ADVOCATE, "Omar Advocate", "ADVOCATE", "INACTIVE").await;

    sqlx::raw_sql(
        "INSERT INTO advocates (advocate_id, user_id) VALUES (1, 1004), (2, 1005), (3, 1010);
         INSERT INTO clients (client_id, user_id) VALUES (1, 1006), (2, 1007);
         INSERT INTO cases (case_id, case_number, client_id, advocate_id) VALUES
             (1, 'CIV-2025-001', 1, 1),
             (2, 'CRIM-2025-002', 2, 2),
             (3, 'CIV-2025-003', 1, 3);",
    )
    .execute(store.pool())
    .await
    .expect("relationship seed should succeed");
}

/// `minutes` after 2025-01-10 09:00 UTC.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0)
        .single()
        .expect("valid base instant")
        .checked_add_signed(Duration::minutes(minutes))
        .expect("offset stays in range")
}

/// Send `text` from `from` to `to` at minute `minutes`.
pub async fn send_at(
    store: &SqliteMessageStore,
    from: UserId,
    to: UserId,
    text: &str,
    minutes: i64,
) -> MessageId {
    let request = SendMessageRequest {
        sender_id: Some(from),
        recipient_id: Some(to),
        text: Some(text.to_owned()),
        case_id: None,
        subject: None,
    };
    send_message(store, request, &MessagingConfig::default(), at(minutes))
        .await
        .expect("send should succeed")
}

pub async fn message_count(store: &SqliteMessageStore) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM messages")
        .fetch_one(store.pool())
        .await
        .expect("count should succeed");
    count
}
