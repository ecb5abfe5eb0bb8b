//! Authentication service
//!
//! Registration, login, logout and "who am I" on top of the credential
//! store and the session manager.
//!
//! Username and email uniqueness is ultimately enforced by the store. The
//! lookup before insert only exists to return a friendly conflict message;
//! a registration that loses a race still ends up as the same conflict.

use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::models::{RegisterInput, Session, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::session::SessionManager;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Loose email shape check: `local@domain.tld` without whitespace
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// Missing or malformed input
    #[error("{0}")]
    ValidationError(String),

    /// Username or email is taken
    #[error("Username or email already exists")]
    Conflict,

    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No valid session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session resolved but its user is gone
    #[error("User not found")]
    UserNotFound,

    /// The session store failed while logging out
    #[error("Failed to logout")]
    LogoutFailed(#[source] anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<SessionManager>) -> Self {
        Self { users, sessions }
    }

    /// Register a new account.
    ///
    /// Username, email and full name are trimmed; the password is stored
    /// exactly as given (hashed).
    pub async fn register(&self, input: RegisterInput) -> Result<User, AuthServiceError> {
        let username = input.username.trim();
        let email = input.email.trim();
        let full_name = input.full_name.trim();

        if username.is_empty() || email.is_empty() || full_name.is_empty() || input.password.is_empty()
        {
            return Err(AuthServiceError::ValidationError(
                "All fields are required".to_string(),
            ));
        }

        if !is_valid_email(email) {
            return Err(AuthServiceError::ValidationError(
                "Please provide a valid email address".to_string(),
            ));
        }

        if self
            .users
            .find_by_username_or_email(username, email)
            .await?
            .is_some()
        {
            return Err(AuthServiceError::Conflict);
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(
            username.to_string(),
            email.to_string(),
            full_name.to_string(),
            password_hash,
        );

        match self.users.create(&user).await {
            Ok(created) => {
                tracing::info!(user_id = created.id, username = %created.username, "User registered");
                Ok(created)
            }
            Err(e) if is_unique_violation(&e) => Err(AuthServiceError::Conflict),
            Err(e) => Err(AuthServiceError::InternalError(e)),
        }
    }

    /// Check credentials and open a session
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, Session), AuthServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.get_by_username(username).await? else {
            tracing::warn!(username, "Login failed: unknown user");
            return Err(AuthServiceError::InvalidCredentials);
        };

        let matches = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !matches {
            tracing::warn!(username, "Login failed: wrong password");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let session = self.sessions.create(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok((user, session))
    }

    /// End a session. Logging out without a session still succeeds.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthServiceError> {
        if let Some(token) = token {
            self.sessions
                .destroy(token)
                .await
                .map_err(AuthServiceError::LogoutFailed)?;
        }
        Ok(())
    }

    /// The user behind a session token
    pub async fn me(&self, token: Option<&str>) -> Result<User, AuthServiceError> {
        let token = token.ok_or(AuthServiceError::NotAuthenticated)?;
        let session = self
            .sessions
            .resolve(token)
            .await?
            .ok_or(AuthServiceError::NotAuthenticated)?;

        self.users
            .get_by_id(session.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}
