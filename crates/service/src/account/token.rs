//! Opaque login tokens.
//!
//! A token is 32 random bytes rendered as 64 hex chars. Only its SHA-512
//! digest is stored, next to a short `token_key` prefix used for lookup.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha512};
use uuid::Uuid;

use super::domain::TokenRecord;
use super::errors::AccountError;

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_KEY_LENGTH: usize = 15;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-512 of the plaintext token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha512::digest(token.as_bytes()))
}

/// Lookup prefix of a presented token; `None` when it is too short to be ours.
pub fn token_key(token: &str) -> Option<&str> {
    if token.len() < TOKEN_KEY_LENGTH || !token.is_ascii() {
        return None;
    }
    Some(&token[..TOKEN_KEY_LENGTH])
}

/// Compare digests without short-circuiting on the first differing byte.
pub fn digests_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Mint a token for `user_id`. Returns the plaintext (shown once) and the
/// record to persist. Fails when `now + ttl` is not representable.
pub fn new_token(
    user_id: i32,
    ttl: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<(String, TokenRecord), AccountError> {
    let expiry = match ttl {
        Some(ttl) => Some(now.checked_add_signed(ttl).ok_or(AccountError::TokenLifetime)?),
        None => None,
    };
    let raw = generate_token();
    let record = TokenRecord {
        id: Uuid::new_v4(),
        user_id,
        token_key: raw[..TOKEN_KEY_LENGTH].to_string(),
        digest: hash_token(&raw),
        created_at: now,
        expiry,
    };
    Ok((raw, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_shape() {
        let (raw, record) = new_token(5, Some(Duration::hours(10)), Utc::now()).unwrap();
        assert_eq!(raw.len(), 64);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(record.token_key, &raw[..15]);
        assert_eq!(record.digest.len(), 128);
        assert_ne!(record.digest, raw);
        assert_eq!(record.expiry.unwrap() - record.created_at, Duration::hours(10));
    }

    #[test]
    fn no_ttl_means_no_expiry() {
        let (_, record) = new_token(1, None, Utc::now()).unwrap();
        assert!(record.expiry.is_none());
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let ttl = Duration::days(365 * 1_000_000);
        assert!(matches!(new_token(1, Some(ttl), Utc::now()), Err(AccountError::TokenLifetime)));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn key_and_digest_helpers() {
        assert!(token_key("short").is_none());
        assert_eq!(token_key("0123456789abcdefXYZ"), Some("0123456789abcde"));
        let d = hash_token("abc");
        assert!(digests_match(&d, &hash_token("abc")));
        assert!(!digests_match(&d, &hash_token("abd")));
        assert!(!digests_match(&d, "abc"));
    }
}
