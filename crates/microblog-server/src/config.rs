//! Runtime configuration, read from the environment (after `.env`) with
//! CLI overrides.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use microblog_api::mail::MailConfig;
use microblog_auth::AuthConfig;

/// Secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &["microblog", "change-me", "dev-secret-change-me"];

/// Microblog: a small social network backend.
#[derive(Parser, Debug)]
#[command(name = "microblog", version, about)]
pub struct Cli {
    /// SQLite database file [env: MICROBLOG_DB_PATH] [default: app.db]
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address [env: MICROBLOG_HOST / MICROBLOG_PORT] [default: 0.0.0.0:5000]
        #[arg(long, short = 'b')]
        bind: Option<String>,
    },
    /// Seed the `user` or `post` table from a JSON array
    PopulateDb {
        table: String,
        json_file: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub secret_key: String,
    pub reset_token_ttl_secs: i64,
    pub session_ttl_secs: i64,
    pub posts_per_page: u32,
    pub mail_sender: String,
    pub base_url: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env(db_path: Option<PathBuf>, bind: Option<String>) -> Result<Self> {
        let host = env_or("MICROBLOG_HOST", "0.0.0.0");
        let port: u16 = env_or("MICROBLOG_PORT", "5000")
            .parse()
            .context("MICROBLOG_PORT must be a port number")?;
        let bind_addr = bind.unwrap_or_else(|| format!("{host}:{port}"));

        Ok(Self {
            base_url: env_or("MICROBLOG_BASE_URL", &format!("http://localhost:{port}")),
            bind_addr,
            db_path: db_path.unwrap_or_else(|| env_or("MICROBLOG_DB_PATH", "app.db").into()),
            secret_key: std::env::var("MICROBLOG_SECRET_KEY").unwrap_or_default(),
            reset_token_ttl_secs: parse_env("MICROBLOG_RESET_TOKEN_TTL", 600)?,
            session_ttl_secs: parse_env("MICROBLOG_SESSION_TTL", 30 * 24 * 60 * 60)?,
            posts_per_page: parse_env("MICROBLOG_POSTS_PER_PAGE", 5)?,
            mail_sender: env_or("MICROBLOG_MAIL_SENDER", "no-reply@microblog.com"),
            log_dir: env_or("MICROBLOG_LOG_DIR", "logs").into(),
        })
    }

    /// The server refuses to sign tokens with an empty or well-known key.
    pub fn require_secret(&self) -> Result<()> {
        if self.secret_key.is_empty() || PLACEHOLDER_SECRETS.contains(&self.secret_key.as_str()) {
            bail!("MICROBLOG_SECRET_KEY is unset or still a placeholder; set it in .env");
        }
        Ok(())
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            secret_key: self.secret_key.clone(),
            reset_token_ttl: chrono::Duration::seconds(self.reset_token_ttl_secs),
            session_ttl: chrono::Duration::seconds(self.session_ttl_secs),
        }
    }

    pub fn mail(&self) -> MailConfig {
        MailConfig {
            sender: self.mail_sender.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
