use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use crate::Database;
use crate::models::PostRow;

pub const MAX_POST_LEN: usize = 256;

impl Database {
    pub fn create_post(&self, author_id: i64, body: &str) -> Result<i64> {
        self.create_post_at(author_id, body, Utc::now())
    }

    pub fn create_post_at(&self, author_id: i64, body: &str, at: DateTime<Utc>) -> Result<i64> {
        self.with_conn(|conn| insert_post(conn, author_id, body, at))
    }

    /// Home feed: the user's own posts plus posts by everyone they follow,
    /// newest first.
    ///
    /// One set-oriented query. The follow edge is joined only for the viewer,
    /// so each post matches at most one edge and no deduplication pass is
    /// needed.
    pub fn following_posts(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, a.username, p.body, p.created_at
                 FROM posts p
                 JOIN users a ON a.id = p.user_id
                 LEFT JOIN followers f ON f.followed_id = a.id AND f.follower_id = ?1
                 WHERE a.id = ?1 OR f.follower_id IS NOT NULL
                 ORDER BY p.created_at DESC, p.id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, a.username, p.body, p.created_at
                 FROM posts p
                 JOIN users a ON a.id = p.user_id
                 WHERE p.user_id = ?1
                 ORDER BY p.created_at DESC, p.id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Global timeline page (1-based) plus the total post count.
    pub fn explore_posts(&self, page: u32, per_page: u32) -> Result<(Vec<PostRow>, i64)> {
        let page = page.max(1);
        let offset = (page as i64 - 1) * per_page as i64;

        self.with_conn(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |r| r.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, a.username, p.body, p.created_at
                 FROM posts p
                 JOIN users a ON a.id = p.user_id
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map((per_page as i64, offset), map_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }
}

pub(crate) fn insert_post(
    conn: &Connection,
    author_id: i64,
    body: &str,
    at: DateTime<Utc>,
) -> Result<i64> {
    let len = body.chars().count();
    if len == 0 || len > MAX_POST_LEN {
        bail!("Post body must be 1..={} characters, got {}", MAX_POST_LEN, len);
    }

    conn.execute(
        "INSERT INTO posts (body, user_id, created_at) VALUES (?1, ?2, ?3)",
        (body, author_id, at),
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_username: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}
