use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, posts, followers)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL DEFAULT '',
                last_seen       TEXT,
                about_me        TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE posts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                body        TEXT NOT NULL CHECK (length(body) BETWEEN 1 AND 256),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_created ON posts(created_at);
            CREATE INDEX idx_posts_user ON posts(user_id);

            CREATE TABLE followers (
                follower_id INTEGER NOT NULL REFERENCES users(id),
                followed_id INTEGER NOT NULL REFERENCES users(id),
                PRIMARY KEY (follower_id, followed_id)
            );

            CREATE INDEX idx_followers_followed ON followers(followed_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (messages, notifications)");
        conn.execute_batch(
            "
            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id       INTEGER NOT NULL REFERENCES users(id),
                recipient_id    INTEGER NOT NULL REFERENCES users(id),
                body            TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_messages_sender ON messages(sender_id);
            CREATE INDEX idx_messages_recipient ON messages(recipient_id, is_read);

            CREATE TABLE notifications (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                timestamp   REAL NOT NULL,
                payload     TEXT NOT NULL,
                UNIQUE (user_id, name)
            );

            CREATE INDEX idx_notifications_timestamp ON notifications(user_id, timestamp);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
