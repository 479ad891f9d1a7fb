//! Bulk loader for demo and test data.
//!
//! Seeded users get an empty password hash, which never verifies. They can
//! only sign in after a password reset.

use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::Database;
use crate::queries::posts::insert_post;
use crate::queries::users::insert_user;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Table name is incorrect!")]
    UnknownTable(String),

    #[error("invalid seed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTable {
    User,
    Post,
}

impl FromStr for SeedTable {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "post" => Ok(Self::Post),
            other => Err(SeedError::UnknownTable(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserSeed {
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct PostSeed {
    body: String,
    /// Author's user id.
    id: i64,
}

impl Database {
    /// Load a JSON array of records into `table`. All records commit in one
    /// transaction; on any error nothing is written.
    pub fn populate(&self, table: &str, json: &str) -> Result<usize, SeedError> {
        let table: SeedTable = table.parse()?;

        let count = match table {
            SeedTable::User => {
                let records: Vec<UserSeed> = serde_json::from_str(json)?;
                self.with_transaction(|tx| {
                    for record in &records {
                        insert_user(tx, &record.username, &record.email, "")?;
                    }
                    Ok(records.len())
                })?
            }
            SeedTable::Post => {
                let records: Vec<PostSeed> = serde_json::from_str(json)?;
                self.with_transaction(|tx| {
                    for record in &records {
                        insert_post(tx, record.id, &record.body, Utc::now())?;
                    }
                    Ok(records.len())
                })?
            }
        };

        info!("Populated {:?} table with {} rows", table, count);
        Ok(count)
    }
}
