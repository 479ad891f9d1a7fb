//! Database row types. These map directly to SQLite rows and stay distinct
//! from the `microblog-types` wire models so the DB layer owns its shape.

use chrono::{DateTime, Utc};
use microblog_auth::PasswordHolder;
use microblog_types::models;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub about_me: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PasswordHolder for UserRow {
    fn password_hash(&self) -> &str {
        &self.password_hash
    }

    fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
    }
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: String,
    pub recipient_id: i64,
    pub recipient_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub timestamp: f64,
    pub payload: String,
}

impl NotificationRow {
    /// Decoded payload. Rows are always written from a `serde_json::Value`,
    /// so a decode failure means the row was edited out of band.
    pub fn data(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.payload)
    }
}

impl From<PostRow> for models::Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.user_id,
            author_username: row.author_username,
            body: row.body,
            timestamp: row.created_at,
        }
    }
}

impl From<MessageRow> for models::Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            sender_username: row.sender_username,
            recipient_id: row.recipient_id,
            recipient_username: row.recipient_username,
            body: row.body,
            timestamp: row.created_at,
            is_read: row.is_read,
        }
    }
}
