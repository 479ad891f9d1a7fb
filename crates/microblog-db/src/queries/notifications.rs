//! Notification ledger: at most one live row per `(user, name)`.
//!
//! Writes are a single `INSERT .. ON CONFLICT DO UPDATE` against the
//! `UNIQUE(user_id, name)` constraint, so concurrent writers for the same
//! key always leave exactly one row.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};

use crate::Database;
use crate::models::NotificationRow;

/// Notification carrying the recipient's unread private message count.
pub const UNREAD_MESSAGE_COUNT: &str = "unread_message_count";

impl Database {
    pub fn add_notification(
        &self,
        user_id: i64,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<()> {
        self.with_conn(|conn| upsert_notification(conn, user_id, name, payload, now_seconds()))
    }

    pub fn add_notification_at(
        &self,
        user_id: i64,
        name: &str,
        payload: &serde_json::Value,
        timestamp: f64,
    ) -> Result<()> {
        self.with_conn(|conn| upsert_notification(conn, user_id, name, payload, timestamp))
    }

    /// Notifications newer than `since`, oldest first.
    pub fn notifications_since(&self, user_id: i64, since: f64) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, name, timestamp, payload
                 FROM notifications
                 WHERE user_id = ?1 AND timestamp > ?2
                 ORDER BY timestamp ASC, id ASC",
            )?;
            let rows = stmt
                .query_map((user_id, since), map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Wall-clock seconds since the epoch. Not monotonic across processes.
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub(crate) fn upsert_notification(
    conn: &Connection,
    user_id: i64,
    name: &str,
    payload: &serde_json::Value,
    timestamp: f64,
) -> Result<()> {
    let payload = serde_json::to_string(payload)?;
    conn.execute(
        "INSERT INTO notifications (user_id, name, timestamp, payload)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (user_id, name) DO UPDATE
            SET timestamp = excluded.timestamp,
                payload = excluded.payload",
        (user_id, name, timestamp, payload),
    )?;
    Ok(())
}

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        timestamp: row.get(3)?,
        payload: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_write_replaces_first() {
        let db = db();
        let u = user(&db, "u");

        db.add_notification_at(u, "n", &json!({"v": "A"}), 10.0).unwrap();
        db.add_notification_at(u, "n", &json!({"v": "B"}), 11.0).unwrap();

        let rows = db.notifications_since(u, 0.0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data().unwrap(), json!({"v": "B"}));
        assert_eq!(rows[0].timestamp, 11.0);
    }

    #[test]
    fn names_and_users_are_independent_keys() {
        let db = db();
        let u = user(&db, "u");
        let v = user(&db, "v");

        db.add_notification_at(u, "a", &json!(1), 1.0).unwrap();
        db.add_notification_at(u, "b", &json!(2), 2.0).unwrap();
        db.add_notification_at(v, "a", &json!(3), 3.0).unwrap();

        assert_eq!(db.notifications_since(u, 0.0).unwrap().len(), 2);
        assert_eq!(db.notifications_since(v, 0.0).unwrap().len(), 1);
    }

    #[test]
    fn since_is_exclusive_and_ascending() {
        let db = db();
        let u = user(&db, "u");

        db.add_notification_at(u, "late", &json!(3), 30.0).unwrap();
        db.add_notification_at(u, "early", &json!(1), 10.0).unwrap();
        db.add_notification_at(u, "middle", &json!(2), 20.0).unwrap();

        let names: Vec<String> = db
            .notifications_since(u, 10.0)
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["middle", "late"]);
    }

    #[test]
    fn wall_clock_timestamps_are_pollable() {
        let db = db();
        let u = user(&db, "u");
        let before = now_seconds() - 1.0;

        db.add_notification(u, UNREAD_MESSAGE_COUNT, &json!(0)).unwrap();

        let rows = db.notifications_since(u, before).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data().unwrap(), json!(0));
    }

    #[test]
    fn concurrent_writers_leave_one_row_per_key() {
        let db = Arc::new(db());
        let u = user(&db, "u");

        let writers: Vec<_> = (0..8)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..50 {
                        db.add_notification(u, "n", &json!({"writer": t, "seq": i}))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let rows = db.notifications_since(u, 0.0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data().unwrap()["seq"], json!(49));
    }
}
