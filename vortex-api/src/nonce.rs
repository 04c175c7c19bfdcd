//! AJAX Nonces and User Tokens
//!
//! Both are HMAC-SHA256 tags keyed by `VORTEX_NONCE_SECRET` over a scope,
//! the user and a tick, where a tick is a 12 hour window. Tags from the
//! current and the previous tick are accepted, so they live between 12 and
//! 24 hours.
//!
//! - A nonce covers `nonce | action | user | tick` and keeps the first ten
//!   hex characters.
//! - A user token covers `user | user | tick` and keeps the full tag. The
//!   fronting site sends it in `X-Vortex-User-Token` next to
//!   `X-Vortex-User`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use vortex_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Length of a nonce window in seconds
pub const NONCE_TICK_SECS: i64 = 12 * 60 * 60;

/// Hex characters kept from the tag
pub const NONCE_LEN: usize = 10;

/// Hex length of a user token
pub const USER_TOKEN_LEN: usize = 64;

/// Issues and verifies action-bound nonces and user tokens
#[derive(Clone)]
pub struct NonceIssuer {
    mac: HmacSha256,
}

impl std::fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceIssuer").finish_non_exhaustive()
    }
}

impl NonceIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .expect("HMAC-SHA256 accepts keys of any length");
        Self { mac }
    }

    /// Issuer with a per-process random secret; nonces do not survive a restart
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    fn tick(at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(NONCE_TICK_SECS)
    }

    fn tag(&self, parts: &[&[u8]]) -> String {
        let mut mac = self.mac.clone();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                mac.update(b"|");
            }
            mac.update(part);
        }
        hex::encode(mac.finalize().into_bytes())
    }

    fn token(&self, action: &str, user: UserId, tick: i64) -> String {
        let mut token = self.tag(&[
            &b"nonce"[..],
            action.as_bytes(),
            &user.0.to_be_bytes(),
            &tick.to_be_bytes(),
        ]);
        token.truncate(NONCE_LEN);
        token
    }

    fn user_tag(&self, user: UserId, tick: i64) -> String {
        self.tag(&[&b"user"[..], &user.0.to_be_bytes(), &tick.to_be_bytes()])
    }

    pub fn create(&self, action: &str, user: UserId) -> String {
        self.create_at(action, user, Utc::now())
    }

    pub fn create_at(&self, action: &str, user: UserId, at: DateTime<Utc>) -> String {
        self.token(action, user, Self::tick(at))
    }

    pub fn verify(&self, action: &str, user: UserId, nonce: &str) -> bool {
        self.verify_at(action, user, nonce, Utc::now())
    }

    pub fn verify_at(&self, action: &str, user: UserId, nonce: &str, at: DateTime<Utc>) -> bool {
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let tick = Self::tick(at);
        [tick, tick - 1]
            .iter()
            .any(|t| constant_time_eq(self.token(action, user, *t).as_bytes(), nonce.as_bytes()))
    }

    /// Token proving the fronting site vouches for `user`
    pub fn user_token(&self, user: UserId) -> String {
        self.user_token_at(user, Utc::now())
    }

    pub fn user_token_at(&self, user: UserId, at: DateTime<Utc>) -> String {
        self.user_tag(user, Self::tick(at))
    }

    pub fn verify_user_token(&self, user: UserId, token: &str) -> bool {
        self.verify_user_token_at(user, token, Utc::now())
    }

    pub fn verify_user_token_at(&self, user: UserId, token: &str, at: DateTime<Utc>) -> bool {
        if token.len() != USER_TOKEN_LEN {
            return false;
        }
        let tick = Self::tick(at);
        [tick, tick - 1]
            .iter()
            .any(|t| constant_time_eq(self.user_tag(user, *t).as_bytes(), token.as_bytes()))
    }
}

/// Byte comparison whose duration does not depend on where inputs differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn issuer() -> NonceIssuer {
        NonceIssuer::new("test-secret")
    }

    #[test]
    fn test_nonce_roundtrip() {
        let issuer = issuer();
        let nonce = issuer.create("vortex_process_transaction", UserId(7));
        assert_eq!(nonce.len(), NONCE_LEN);
        assert!(issuer.verify("vortex_process_transaction", UserId(7), &nonce));
    }

    #[test]
    fn test_nonce_is_bound_to_action_and_user() {
        let issuer = issuer();
        let nonce = issuer.create("vortex_connect_wallet", UserId(7));
        assert!(!issuer.verify("vortex_disconnect_wallet", UserId(7), &nonce));
        assert!(!issuer.verify("vortex_connect_wallet", UserId(8), &nonce));
        assert!(!NonceIssuer::new("other").verify("vortex_connect_wallet", UserId(7), &nonce));
    }

    #[test]
    fn test_nonce_window() {
        let issuer = issuer();
        let issued_at = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();
        let nonce = issuer.create_at("a", UserId(1), issued_at);

        assert!(issuer.verify_at("a", UserId(1), &nonce, issued_at + Duration::hours(11)));
        assert!(issuer.verify_at("a", UserId(1), &nonce, issued_at + Duration::hours(20)));
        assert!(!issuer.verify_at("a", UserId(1), &nonce, issued_at + Duration::hours(36)));
    }

    #[test]
    fn test_nonce_is_hmac_sha256() {
        let issuer = issuer();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let tick = at.timestamp().div_euclid(NONCE_TICK_SECS);

        let mut mac = HmacSha256::new_from_slice(b"test-secret").unwrap();
        mac.update(b"nonce|a|");
        mac.update(&1u64.to_be_bytes());
        mac.update(b"|");
        mac.update(&tick.to_be_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(issuer.create_at("a", UserId(1), at), expected[..NONCE_LEN]);
    }

    #[test]
    fn test_malformed_nonce_rejected() {
        let issuer = issuer();
        assert!(!issuer.verify("a", UserId(1), ""));
        assert!(!issuer.verify("a", UserId(1), "not-a-nonce-at-all"));
    }

    #[test]
    fn test_user_token_bound_to_user() {
        let issuer = issuer();
        let token = issuer.user_token(UserId(42));
        assert_eq!(token.len(), USER_TOKEN_LEN);
        assert!(issuer.verify_user_token(UserId(42), &token));
        assert!(!issuer.verify_user_token(UserId(1), &token));
        assert!(!NonceIssuer::new("other").verify_user_token(UserId(42), &token));
        assert!(!issuer.verify_user_token(UserId(42), &token[..NONCE_LEN]));
    }

    #[test]
    fn test_user_token_differs_from_nonce_scope() {
        let issuer = issuer();
        let token = issuer.user_token(UserId(3));
        let nonce = issuer.create("user", UserId(3));
        assert_ne!(&token[..NONCE_LEN], nonce);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
