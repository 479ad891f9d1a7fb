use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Database;
use crate::models::UserRow;

const USER_COLUMNS: &str = "id, username, email, password_hash, last_seen, about_me, created_at";

impl Database {
    pub fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| insert_user(conn, username, email, password_hash))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    /// Persist `user.password_hash` after it was changed in memory.
    pub fn save_password(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                (&user.password_hash, user.id),
            )?;
            Ok(())
        })
    }

    pub fn update_profile(&self, id: i64, username: &str, about_me: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET username = ?1, about_me = ?2 WHERE id = ?3",
                (username, about_me, id),
            )?;
            Ok(())
        })
    }

    pub fn touch_last_seen(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET last_seen = ?1 WHERE id = ?2", (at, id))?;
            Ok(())
        })
    }
}

pub(crate) fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        (username, email, password_hash),
    )?;
    Ok(conn.last_insert_rowid())
}

fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn.query_row(&sql, [value], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        last_seen: row.get(4)?,
        about_me: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::queries::test_support::{at, db, user};
    use microblog_auth::{AuthConfig, CredentialStore};

    #[test]
    fn lookups_by_each_unique_key() {
        let db = db();
        let id = user(&db, "alice");

        assert_eq!(db.get_user_by_id(id).unwrap().unwrap().username, "alice");
        assert_eq!(db.get_user_by_username("alice").unwrap().unwrap().id, id);
        assert_eq!(
            db.get_user_by_email("alice@example.com").unwrap().unwrap().id,
            id
        );
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn username_and_email_are_unique() {
        let db = db();
        db.create_user("alice", "alice@example.com", "").unwrap();

        assert!(db.create_user("alice", "other@example.com", "").is_err());
        assert!(db.create_user("other", "alice@example.com", "").is_err());
    }

    #[test]
    fn password_change_is_persisted() {
        let db = db();
        let store = CredentialStore::new(AuthConfig::new("secret"));
        let id = user(&db, "alice");

        let mut row = db.get_user_by_id(id).unwrap().unwrap();
        store.set_password(&mut row, "correct horse").unwrap();
        db.save_password(&row).unwrap();

        let reloaded = db.get_user_by_id(id).unwrap().unwrap();
        assert!(store.verify_password(&reloaded, "correct horse"));
        assert!(!store.verify_password(&reloaded, "wrong"));
    }

    #[test]
    fn profile_and_last_seen_updates() {
        let db = db();
        let id = user(&db, "alice");

        db.update_profile(id, "alicia", Some("hi there")).unwrap();
        db.touch_last_seen(id, at(1_700_000_000)).unwrap();

        let row = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(row.username, "alicia");
        assert_eq!(row.about_me.as_deref(), Some("hi there"));
        assert_eq!(row.last_seen, Some(at(1_700_000_000)));
    }

    #[test]
    fn new_user_gets_a_creation_time() {
        let db = db();
        let before = chrono::Utc::now() - chrono::Duration::seconds(5);
        let id = user(&db, "alice");

        let row = db.get_user_by_id(id).unwrap().unwrap();
        assert!(row.created_at >= before);
        assert!(row.last_seen.is_none());
    }
}
