//! Social graph: the directed `followers` edge set.
//!
//! Self-edges are not rejected here. Refusing "follow yourself" is a route
//! policy, so a direct `follow(u, u)` does create the edge.

use anyhow::Result;
use rusqlite::Connection;

use crate::Database;

impl Database {
    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, follower_id, followed_id))
    }

    /// Adds the edge unless present. Returns whether a new edge was created.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO followers (follower_id, followed_id) VALUES (?1, ?2)",
                (follower_id, followed_id),
            )?;
            Ok(inserted > 0)
        })
    }

    /// Removes the edge if present. Returns whether an edge was removed.
    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM followers WHERE follower_id = ?1 AND followed_id = ?2",
                (follower_id, followed_id),
            )?;
            Ok(removed > 0)
        })
    }

    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM followers WHERE follower_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }

    pub fn followers_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM followers WHERE followed_id = ?1",
                [user_id],
                |r| r.get(0),
            )?)
        })
    }

    /// Ids of users `user_id` follows, ascending.
    pub fn following_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            neighbour_ids(
                conn,
                "SELECT followed_id FROM followers WHERE follower_id = ?1 ORDER BY followed_id",
                user_id,
            )
        })
    }

    /// Ids of users following `user_id`, ascending.
    pub fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            neighbour_ids(
                conn,
                "SELECT follower_id FROM followers WHERE followed_id = ?1 ORDER BY follower_id",
                user_id,
            )
        })
    }
}

fn edge_exists(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM followers WHERE follower_id = ?1 AND followed_id = ?2)",
        (follower_id, followed_id),
        |r| r.get(0),
    )?;
    Ok(exists)
}

fn neighbour_ids(conn: &Connection, sql: &str, user_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([user_id], |r| r.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}
