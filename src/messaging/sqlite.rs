//! SQLite-backed [`MessageStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::trace;

use super::format::{parse_storage, parse_storage_opt, to_storage};
use super::model::{
    MarkReadOutcome, Message, MessageId, MessageRecord, NewMessage, ReadState, Role, UserId,
    UserSummary,
};
use super::store::MessageStore;
use super::MessagingError;

/// Account status value that makes a user eligible as a contact.
const ACTIVE_STATUS: &str = "ACTIVE";

/// Most ids bound into a single `IN (...)` list.
const USERS_BY_IDS_CHUNK: usize = 500;

/// Row type for bare `messages` queries.
type MessageRow = (
    i64,
    Option<i64>,
    i64,
    i64,
    Option<String>,
    String,
    bool,
    String,
    Option<String>,
);

/// Row type for `messages` joined with participant names and case number.
type RecordRow = (
    i64,
    Option<i64>,
    i64,
    i64,
    Option<String>,
    String,
    bool,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
);

const MESSAGE_COLUMNS: &str = "m.message_id AS message_id, m.case_id AS case_id, \
     m.sender_id AS sender_id, m.recipient_id AS recipient_id, m.subject AS subject, \
     m.message_text AS message_text, m.is_read AS is_read, m.sent_at AS sent_at, \
     m.read_at AS read_at";

const RECORD_SELECT: &str = "SELECT m.message_id, m.case_id, m.sender_id, m.recipient_id, \
     m.subject, m.message_text, m.is_read, m.sent_at, m.read_at, \
     su.name, ru.name, c.case_number \
     FROM messages m \
     JOIN users su ON su.user_id = m.sender_id \
     JOIN users ru ON ru.user_id = m.recipient_id \
     LEFT JOIN cases c ON c.case_id = m.case_id";

/// Message store over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Wrap an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying SQLite pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_records(
        &self,
        filter: &str,
        user: UserId,
    ) -> Result<Vec<MessageRecord>, MessagingError> {
        let sql = format!("{RECORD_SELECT} {filter}");
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(record_from_row).collect()
    }
}

/// Convert a `MessageRow` tuple into a [`Message`], propagating decode errors.
fn message_from_row(row: MessageRow) -> Result<Message, MessagingError> {
    let (id, case_id, sender_id, recipient_id, subject, text, is_read, sent_at, read_at) = row;
    let read_at = parse_storage_opt("read_at", read_at.as_deref())?;
    Ok(Message {
        id,
        sender_id,
        recipient_id,
        case_id,
        subject,
        text,
        sent_at: parse_storage("sent_at", &sent_at)?,
        read_state: ReadState::from_columns(is_read, read_at)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<MessageRecord, MessagingError> {
    let message = message_from_row((
        row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8,
    ))?;
    Ok(MessageRecord {
        message,
        sender_name: row.9,
        recipient_name: row.10,
        case_number: row.11,
    })
}

fn ids_from_rows(rows: Vec<(i64,)>) -> Vec<UserId> {
    rows.into_iter().map(|(id,)| id).collect()
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn active_user_ids_with_role(&self, role: Role) -> Result<Vec<UserId>, MessagingError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM users WHERE role = ?1 AND status = ?2")
                .bind(role.as_str())
                .bind(ACTIVE_STATUS)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids_from_rows(rows))
    }

    async fn active_user_ids(&self) -> Result<Vec<UserId>, MessagingError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT user_id FROM users WHERE status = ?1")
            .bind(ACTIVE_STATUS)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids_from_rows(rows))
    }

    async fn advocate_ids_for_client_cases(
        &self,
        client: UserId,
    ) -> Result<Vec<UserId>, MessagingError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT DISTINCT u.user_id FROM users u \
             JOIN advocates a ON a.user_id = u.user_id \
             JOIN cases c ON c.advocate_id = a.advocate_id \
             JOIN clients cl ON cl.client_id = c.client_id \
             WHERE cl.user_id = ?1 AND u.status = ?2",
        )
        .bind(client)
        .bind(ACTIVE_STATUS)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids_from_rows(rows))
    }

    async fn client_ids_for_advocate_cases(
        &self,
        advocate: UserId,
    ) -> Result<Vec<UserId>, MessagingError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT DISTINCT u.user_id FROM users u \
             JOIN clients cl ON cl.user_id = u.user_id \
             JOIN cases c ON c.client_id = cl.client_id \
             JOIN advocates a ON a.advocate_id = c.advocate_id \
             WHERE a.user_id = ?1 AND u.status = ?2",
        )
        .bind(advocate)
        .bind(ACTIVE_STATUS)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids_from_rows(rows))
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, MessagingError> {
        let mut users = Vec::with_capacity(ids.len());
        // SQLite caps bound parameters per statement.
        for chunk in ids.chunks(USERS_BY_IDS_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(
                "SELECT user_id, name, role FROM users WHERE user_id IN (",
            );
            {
                let mut separated = builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(")");
            }

            let rows: Vec<(i64, String, String)> =
                builder.build_query_as().fetch_all(&self.pool).await?;
            users.extend(
                rows.into_iter()
                    .map(|(id, name, role)| UserSummary { id, name, role }),
            );
        }
        Ok(users)
    }

    async fn user_role(&self, user: UserId) -> Result<Option<String>, MessagingError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE user_id = ?1")
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(role,)| role))
    }

    async fn is_active_user(&self, user: UserId) -> Result<bool, MessagingError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM users WHERE user_id = ?1 AND status = ?2")
                .bind(user)
                .bind(ACTIVE_STATUS)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn unread_counts_by_sender(
        &self,
        viewer: UserId,
    ) -> Result<HashMap<UserId, u64>, MessagingError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT sender_id, count(*) FROM messages \
             WHERE recipient_id = ?1 AND is_read = 0 \
             GROUP BY sender_id",
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            // count(*) is always non-negative.
            .map(|(sender, count)| (sender, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    async fn latest_message_per_counterpart(
        &self,
        viewer: UserId,
    ) -> Result<HashMap<UserId, Message>, MessagingError> {
        let sql = format!(
            "SELECT message_id, case_id, sender_id, recipient_id, subject, message_text, \
             is_read, sent_at, read_at FROM ( \
               SELECT {MESSAGE_COLUMNS}, ROW_NUMBER() OVER ( \
                 PARTITION BY CASE WHEN m.sender_id = ?1 THEN m.recipient_id ELSE m.sender_id END \
                 ORDER BY m.sent_at DESC, m.message_id DESC \
               ) AS rn \
               FROM messages m WHERE m.sender_id = ?1 OR m.recipient_id = ?1 \
             ) WHERE rn = 1"
        );
        let rows: Vec<MessageRow> = sqlx::query_as(&sql)
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;

        let mut latest = HashMap::with_capacity(rows.len());
        for row in rows {
            let message = message_from_row(row)?;
            latest.insert(message.counterpart_of(viewer), message);
        }
        Ok(latest)
    }

    async fn thread_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<MessageRecord>, MessagingError> {
        let sql = format!(
            "{RECORD_SELECT} \
             WHERE (m.sender_id = ?1 AND m.recipient_id = ?2) \
                OR (m.sender_id = ?2 AND m.recipient_id = ?1) \
             ORDER BY m.sent_at ASC, m.message_id ASC"
        );
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(a)
            .bind(b)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(record_from_row).collect()
    }

    async fn received_by(&self, user: UserId) -> Result<Vec<MessageRecord>, MessagingError> {
        self.fetch_records(
            "WHERE m.recipient_id = ?1 ORDER BY m.sent_at DESC, m.message_id DESC",
            user,
        )
        .await
    }

    async fn sent_by(&self, user: UserId) -> Result<Vec<MessageRecord>, MessagingError> {
        self.fetch_records(
            "WHERE m.sender_id = ?1 ORDER BY m.sent_at DESC, m.message_id DESC",
            user,
        )
        .await
    }

    async fn message_record(
        &self,
        id: MessageId,
    ) -> Result<Option<MessageRecord>, MessagingError> {
        let sql = format!("{RECORD_SELECT} WHERE m.message_id = ?1");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    async fn insert_message(
        &self,
        message: &NewMessage,
        sent_at: DateTime<Utc>,
    ) -> Result<MessageId, MessagingError> {
        let result = sqlx::query(
            "INSERT INTO messages (case_id, sender_id, recipient_id, subject, message_text, \
             is_read, sent_at) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        )
        .bind(message.case_id)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(&message.subject)
        .bind(&message.text)
        .bind(to_storage(sent_at))
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        trace!(
            message_id = id,
            sender_id = message.sender_id,
            recipient_id = message.recipient_id,
            "message inserted"
        );
        Ok(id)
    }

    async fn mark_read_by_id(
        &self,
        id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<MarkReadOutcome, MessagingError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1, read_at = ?2 \
             WHERE message_id = ?1 AND is_read = 0",
        )
        .bind(id)
        .bind(to_storage(at))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            trace!(message_id = id, "message marked read");
            return Ok(MarkReadOutcome::Marked);
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM messages WHERE message_id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(if exists.is_some() {
            MarkReadOutcome::AlreadyRead
        } else {
            MarkReadOutcome::NotFound
        })
    }

    async fn mark_thread_read(
        &self,
        sender: UserId,
        recipient: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, MessagingError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = 1, read_at = ?3 \
             WHERE sender_id = ?1 AND recipient_id = ?2 AND is_read = 0",
        )
        .bind(sender)
        .bind(recipient)
        .bind(to_storage(at))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
