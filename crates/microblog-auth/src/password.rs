use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::{AuthError, CredentialStore};

/// Anything that carries a stored password hash.
pub trait PasswordHolder {
    fn password_hash(&self) -> &str;
    fn set_password_hash(&mut self, hash: String);
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a plaintext password against a stored PHC hash string.
///
/// An empty or unparseable hash never verifies. Seeded accounts carry an
/// empty hash and therefore cannot log in until they reset their password.
pub fn verify_password(stored_hash: &str, plaintext: &str) -> bool {
    if stored_hash.is_empty() {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Short fingerprint of a stored hash: its PHC salt segment.
///
/// Every call to [`hash_password`] draws a fresh salt, so the stamp changes
/// whenever the password does. Empty or unparseable hashes stamp as `""`.
pub fn password_stamp(stored_hash: &str) -> String {
    PasswordHash::new(stored_hash)
        .ok()
        .and_then(|parsed| parsed.salt.map(|salt| salt.as_str().to_string()))
        .unwrap_or_default()
}

impl CredentialStore {
    /// Replace the holder's hash. The caller persists the change.
    pub fn set_password<H: PasswordHolder>(
        &self,
        holder: &mut H,
        plaintext: &str,
    ) -> Result<(), AuthError> {
        holder.set_password_hash(hash_password(plaintext)?);
        Ok(())
    }

    pub fn verify_password<H: PasswordHolder>(&self, holder: &H, plaintext: &str) -> bool {
        verify_password(holder.password_hash(), plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthConfig;

    struct Account {
        hash: String,
    }

    impl PasswordHolder for Account {
        fn password_hash(&self) -> &str {
            &self.hash
        }

        fn set_password_hash(&mut self, hash: String) {
            self.hash = hash;
        }
    }

    #[test]
    fn set_then_verify() {
        let store = CredentialStore::new(AuthConfig::new("test-secret"));
        let mut account = Account { hash: String::new() };

        store.set_password(&mut account, "hunter22").unwrap();

        assert!(account.hash.starts_with("$argon2"));
        assert!(store.verify_password(&account, "hunter22"));
        assert!(!store.verify_password(&account, "hunter23"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same"));
        assert!(verify_password(&b, "same"));
    }

    #[test]
    fn empty_hash_never_verifies() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn stamp_follows_the_salt() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();

        assert!(!password_stamp(&a).is_empty());
        assert_eq!(password_stamp(&a), password_stamp(&a));
        assert_ne!(password_stamp(&a), password_stamp(&b));
        assert!(a.contains(&password_stamp(&a)));
        assert_eq!(password_stamp(""), "");
        assert_eq!(password_stamp("not-a-phc-string"), "");
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "password"));
    }
}
