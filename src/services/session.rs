//! Session manager
//!
//! Issues, resolves and destroys login sessions, and produces the signed
//! cookie that carries a session token to the browser.
//!
//! The cookie value is `<token>.<signature>`, where the signature is
//! HMAC-SHA256 of the token keyed by the configured secret and encoded as
//! unpadded base64url. A value whose signature does not verify is treated as
//! if no cookie had been sent.
//!
//! Expiry is passive: an expired session is deleted the moment someone tries
//! to resolve it. There is no background sweep.

use crate::config::{SessionConfig, MAX_SESSION_TTL_DAYS};
use crate::db::repositories::SessionRepository;
use crate::models::Session;
use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Format of the `Expires` cookie attribute (IMF-fixdate)
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub struct SessionManager {
    repo: Arc<dyn SessionRepository>,
    mac: HmacSha256,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn SessionRepository>, config: &SessionConfig) -> Result<Self> {
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&config.ttl_days) {
            return Err(anyhow!(
                "Session lifetime must be between 1 and {} days, got {}",
                MAX_SESSION_TTL_DAYS,
                config.ttl_days
            ));
        }

        let mac = HmacSha256::new_from_slice(config.secret.as_bytes())
            .map_err(|e| anyhow!("Invalid session secret: {}", e))?;

        Ok(Self {
            repo,
            mac,
            cookie_name: config.cookie_name.clone(),
            ttl: Duration::days(config.ttl_days),
            secure: config.secure_cookie,
        })
    }

    /// Name of the session cookie
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Persist a fresh session for `user_id`
    pub async fn create(&self, user_id: i64) -> Result<Session> {
        let session = Session::issue(user_id, self.ttl);
        self.repo
            .create(&session)
            .await
            .context("Failed to store session")
    }

    /// Look up a live session by token.
    ///
    /// An expired session is removed and reported as absent.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        let Some(session) = self.repo.get_by_id(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            tracing::debug!(user_id = session.user_id, "Removing expired session");
            self.repo.delete(&session.id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete a session; a missing one is not an error
    pub async fn destroy(&self, token: &str) -> Result<()> {
        self.repo.delete(token).await
    }

    /// Signed cookie value for a token
    pub fn sign(&self, token: &str) -> String {
        format!("{}.{}", token, BASE64URL_NOPAD.encode(&self.signature(token)))
    }

    /// Recover the token from a signed value, or `None` if the signature
    /// is missing, malformed or does not match.
    pub fn verify(&self, signed: &str) -> Option<String> {
        let (token, signature) = signed.rsplit_once('.')?;
        if token.is_empty() {
            return None;
        }
        let signature = BASE64URL_NOPAD.decode(signature.as_bytes()).ok()?;

        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature).ok()?;

        Some(token.to_string())
    }

    /// `Set-Cookie` value that stores the session in the browser
    pub fn cookie(&self, session: &Session) -> String {
        self.build_cookie(
            &self.sign(&session.id),
            self.ttl.num_seconds(),
            &session.expires_at.format(COOKIE_DATE_FORMAT).to_string(),
        )
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        self.build_cookie("", 0, "Thu, 01 Jan 1970 00:00:00 GMT")
    }

    fn build_cookie(&self, value: &str, max_age: i64, expires: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}; Expires={}",
            self.cookie_name, value, max_age, expires
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn signature(&self, token: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}
