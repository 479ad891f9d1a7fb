use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use microblog_types::api::Claims;

use crate::password::{PasswordHolder, password_stamp};
use crate::{AuthError, CredentialStore};

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    reset_password: i64,
    stamp: String,
    exp: usize,
}

/// A reset token whose signature and expiry checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetGrant {
    pub user_id: i64,
    stamp: String,
}

impl ResetGrant {
    /// False once the holder's password changed after the token was issued,
    /// which makes each token good for a single reset.
    pub fn is_current_for<H: PasswordHolder>(&self, holder: &H) -> bool {
        password_stamp(holder.password_hash()) == self.stamp
    }
}

impl CredentialStore {
    /// Signed token allowing one password change for `user_id`, valid for
    /// the configured reset TTL. `holder` is the account's current
    /// credentials.
    pub fn issue_reset_token<H: PasswordHolder>(
        &self,
        user_id: i64,
        holder: &H,
    ) -> Result<String, AuthError> {
        self.issue_reset_token_at(user_id, holder, Utc::now())
    }

    pub(crate) fn issue_reset_token_at<H: PasswordHolder>(
        &self,
        user_id: i64,
        holder: &H,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = ResetClaims {
            reset_password: user_id,
            stamp: password_stamp(holder.password_hash()),
            exp: (issued_at + self.config.reset_token_ttl).timestamp().max(0) as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key())?)
    }

    /// Checks signature and expiry. Bad signature, expiry and malformed
    /// input all collapse into `None`; the caller still has to confirm the
    /// grant with [`ResetGrant::is_current_for`].
    pub fn validate_reset_token(&self, token: &str) -> Option<ResetGrant> {
        match decode::<ResetClaims>(token, &self.decoding_key(), &strict_validation()) {
            Ok(data) => Some(ResetGrant {
                user_id: data.claims.reset_password,
                stamp: data.claims.stamp,
            }),
            Err(e) => {
                debug!("Rejected reset token: {}", e);
                None
            }
        }
    }

    pub fn issue_session_token(&self, user_id: i64, username: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: (Utc::now() + self.config.session_ttl).timestamp().max(0) as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key())?)
    }

    pub fn validate_session_token(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding_key(), &strict_validation())
            .map(|data| data.claims)
            .ok()
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.config.secret_key.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.config.secret_key.as_bytes())
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}
