//! Encrypted session cookies.
//!
//! The session is JSON sealed with AES-256-GCM (key = SHA-256 of the
//! configured secret) and carried base64url-encoded as `nonce || ciphertext || tag`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use cookie::Cookie;
use openssl::symm::{Cipher, decrypt_aead, encrypt_aead};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::context::AppContext;
use super::error::{HandlerError, HttpError};
use super::parsing::ApiRequest;
use crate::core::config::AppConfig;
use crate::core::models::User;
use crate::errors::ServiceError;

pub const SESSION_COOKIE: &str = "SES";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub user: String,
    pub when: DateTime<Utc>,
}

fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

impl Session {
    #[must_use]
    pub fn new(name: &str, user: &str) -> Self {
        Self {
            name: name.to_string(),
            user: user.to_string(),
            when: Utc::now(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization or encryption fails.
    pub fn encrypt(&self, secret: &str) -> Result<String, ServiceError> {
        let plain = serde_json::to_vec(self)?;
        let key = derive_key(secret);

        let mut nonce = [0u8; NONCE_LEN];
        openssl::rand::rand_bytes(&mut nonce)?;
        let mut tag = [0u8; TAG_LEN];
        let sealed = encrypt_aead(
            Cipher::aes_256_gcm(),
            &key,
            Some(&nonce[..]),
            &[],
            &plain,
            &mut tag,
        )?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len() + TAG_LEN);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        out.extend_from_slice(&tag);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// # Errors
    ///
    /// Returns an error if the value is not valid base64, was sealed under
    /// another key, was tampered with, or does not hold a session.
    pub fn decrypt(value: &str, secret: &str) -> Result<Self, ServiceError> {
        let raw = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| ServiceError::CryptoError(format!("session decode: {e}")))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(ServiceError::CryptoError("session too short".to_string()));
        }

        let (nonce, rest) = raw.split_at(NONCE_LEN);
        let (sealed, tag) = rest.split_at(rest.len() - TAG_LEN);
        let key = derive_key(secret);
        let plain = decrypt_aead(Cipher::aes_256_gcm(), &key, Some(nonce), &[], sealed, tag)?;

        serde_json::from_slice(&plain)
            .map_err(|e| ServiceError::CryptoError(format!("session parse: {e}")))
    }

    #[must_use]
    pub fn is_expired(&self, timeout_minutes: i64, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.when) > Duration::minutes(timeout_minutes)
    }
}

/// `Set-Cookie` value carrying an encrypted session.
#[must_use]
pub fn session_cookie(value: String, config: &AppConfig) -> String {
    let ttl = time::Duration::minutes(config.session_timeout_minutes);
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .max_age(ttl)
        .expires(time::OffsetDateTime::now_utc() + ttl)
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop the session.
#[must_use]
pub fn clear_cookie(config: &AppConfig) -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(-1))
        .expires(time::OffsetDateTime::now_utc())
        .build()
        .to_string()
}

/// Resolve the logged-in user from the session cookie.
///
/// On success also returns a refreshed cookie so active sessions slide forward.
///
/// # Errors
///
/// Returns 401 when there is no valid, unexpired session for a known user.
pub async fn authenticate(
    ctx: &AppContext,
    req: &ApiRequest,
) -> Result<(User, String), HandlerError> {
    let Some(value) = req.cookie(SESSION_COOKIE).filter(|v| !v.is_empty()) else {
        return Err(HttpError::unauthorized().into());
    };

    let session = match Session::decrypt(&value, &ctx.config.session_key) {
        Ok(s) => s,
        Err(e) => {
            debug!("Rejected session cookie: {}", e);
            return Err(HttpError::unauthorized().into());
        }
    };

    if session.is_expired(ctx.config.session_timeout_minutes, Utc::now()) {
        debug!(user = %session.user, "Session expired");
        return Err(HttpError::unauthorized().into());
    }

    let Some(user) = ctx.repo.user(&session.user).await? else {
        debug!(user = %session.user, "Session refers to unknown user");
        return Err(HttpError::unauthorized().into());
    };

    let refreshed = Session::new(&user.name, &user.id).encrypt(&ctx.config.session_key)?;
    Ok((user, session_cookie(refreshed, &ctx.config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_restores_session() {
        let s = Session::new("egon", "U123");
        let sealed = s.encrypt("secret").unwrap();
        assert!(!sealed.contains("egon"));
        assert_eq!(Session::decrypt(&sealed, "secret").unwrap(), s);
    }

    #[test]
    fn decrypt_with_other_key_fails() {
        let sealed = Session::new("egon", "U123").encrypt("secret").unwrap();
        assert!(Session::decrypt(&sealed, "other").is_err());
    }

    #[test]
    fn tampered_value_fails() {
        let sealed = Session::new("egon", "U123").encrypt("secret").unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(&sealed).unwrap();
        raw[NONCE_LEN] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(raw);
        assert!(Session::decrypt(&tampered, "secret").is_err());
        assert!(Session::decrypt("short", "secret").is_err());
    }

    #[test]
    fn nonce_differs_between_encryptions() {
        let s = Session::new("egon", "U123");
        assert_ne!(s.encrypt("secret").unwrap(), s.encrypt("secret").unwrap());
    }

    #[test]
    fn expiry_uses_timeout_minutes() {
        let mut s = Session::new("egon", "U123");
        let now = Utc::now();
        s.when = now - Duration::minutes(30);
        assert!(!s.is_expired(60, now));
        assert!(s.is_expired(29, now));
    }
}
