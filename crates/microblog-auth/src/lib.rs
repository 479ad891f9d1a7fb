//! Credential store for Microblog.
//!
//! Passwords are hashed with Argon2id. Reset and session tokens are HS256
//! JWTs signed with the process secret from [`AuthConfig`].

pub mod password;
pub mod tokens;

use chrono::Duration;
use thiserror::Error;

pub use password::PasswordHolder;
pub use tokens::ResetGrant;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Secrets and lifetimes the credential store is constructed with.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub reset_token_ttl: Duration,
    pub session_ttl: Duration,
}

impl AuthConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            reset_token_ttl: Duration::seconds(600),
            session_ttl: Duration::days(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    config: AuthConfig,
}

impl CredentialStore {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
