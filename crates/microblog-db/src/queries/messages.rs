use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use serde_json::json;

use crate::Database;
use crate::models::MessageRow;
use crate::queries::notifications::{UNREAD_MESSAGE_COUNT, now_seconds, upsert_notification};

const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, s.username, m.recipient_id, r.username,
            m.body, m.created_at, m.is_read
     FROM messages m
     JOIN users s ON s.id = m.sender_id
     JOIN users r ON r.id = m.recipient_id";

impl Database {
    pub fn send_message(&self, sender_id: i64, recipient_id: i64, body: &str) -> Result<i64> {
        self.send_message_at(sender_id, recipient_id, body, Utc::now())
    }

    pub fn send_message_at(
        &self,
        sender_id: i64,
        recipient_id: i64,
        body: &str,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        self.with_conn(|conn| insert_message(conn, sender_id, recipient_id, body, at))
    }

    /// Sends a message and refreshes the recipient's unread-count
    /// notification in the same transaction.
    pub fn deliver_message(&self, sender_id: i64, recipient_id: i64, body: &str) -> Result<i64> {
        self.with_transaction(|tx| {
            let id = insert_message(tx, sender_id, recipient_id, body, Utc::now())?;
            let unread = count_unread(tx, recipient_id)?;
            upsert_notification(tx, recipient_id, UNREAD_MESSAGE_COUNT, &json!(unread), now_seconds())?;
            Ok(id)
        })
    }

    /// Full thread between two users in both directions, oldest first.
    pub fn get_conversation(&self, a: i64, b: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_conversation(conn, a, b))
    }

    /// Marks every message from `peer_id` to `viewer_id` read. Returns the
    /// number of rows flipped.
    pub fn mark_as_read(&self, viewer_id: i64, peer_id: i64) -> Result<usize> {
        self.with_conn(|conn| mark_read(conn, viewer_id, peer_id))
    }

    /// What the viewer sees when opening a conversation: the peer's messages
    /// are marked read and the viewer's unread-count notification is
    /// refreshed, all committed together.
    pub fn open_conversation(&self, viewer_id: i64, peer_id: i64) -> Result<Vec<MessageRow>> {
        self.with_transaction(|tx| {
            mark_read(tx, viewer_id, peer_id)?;
            let unread = count_unread(tx, viewer_id)?;
            upsert_notification(tx, viewer_id, UNREAD_MESSAGE_COUNT, &json!(unread), now_seconds())?;
            query_conversation(tx, viewer_id, peer_id)
        })
    }

    /// One entry per sender who has messaged `user_id`: that sender's most
    /// recent message. Newest conversation first.
    pub fn get_chat_list(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{MESSAGE_SELECT}
                 WHERE m.recipient_id = ?1
                   AND m.id = (
                       SELECT latest.id FROM messages latest
                       WHERE latest.recipient_id = ?1 AND latest.sender_id = m.sender_id
                       ORDER BY latest.created_at DESC, latest.id DESC
                       LIMIT 1
                   )
                 ORDER BY m.created_at DESC, m.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn unread_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| count_unread(conn, user_id))
    }
}

fn insert_message(
    conn: &Connection,
    sender_id: i64,
    recipient_id: i64,
    body: &str,
    at: DateTime<Utc>,
) -> Result<i64> {
    if sender_id == recipient_id {
        bail!("User {} cannot send a message to themselves", sender_id);
    }

    conn.execute(
        "INSERT INTO messages (sender_id, recipient_id, body, created_at, is_read)
         VALUES (?1, ?2, ?3, ?4, 0)",
        (sender_id, recipient_id, body, at),
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_conversation(conn: &Connection, a: i64, b: i64) -> Result<Vec<MessageRow>> {
    let sql = format!(
        "{MESSAGE_SELECT}
         WHERE (m.sender_id = ?1 AND m.recipient_id = ?2)
            OR (m.sender_id = ?2 AND m.recipient_id = ?1)
         ORDER BY m.created_at ASC, m.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((a, b), map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn mark_read(conn: &Connection, viewer_id: i64, peer_id: i64) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE messages SET is_read = 1
         WHERE sender_id = ?1 AND recipient_id = ?2 AND is_read = 0",
        (peer_id, viewer_id),
    )?;
    Ok(changed)
}

fn count_unread(conn: &Connection, user_id: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = ?1 AND is_read = 0",
        [user_id],
        |r| r.get(0),
    )?)
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        sender_username: row.get(2)?,
        recipient_id: row.get(3)?,
        recipient_username: row.get(4)?,
        body: row.get(5)?,
        created_at: row.get(6)?,
        is_read: row.get(7)?,
    })
}
