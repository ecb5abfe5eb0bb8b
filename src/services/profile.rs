//! Profile service
//!
//! Reads and updates the signed-in user's own profile. Only email and full
//! name are editable.

use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::models::{UpdateProfileInput, User};
use crate::services::auth::is_valid_email;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProfileServiceError {
    #[error("{0}")]
    ValidationError(String),

    #[error("Email already in use")]
    EmailInUse,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<User, ProfileServiceError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileServiceError::UserNotFound)
    }

    /// Update email and full name of `user_id`.
    ///
    /// The email may stay the same; it conflicts only with other users.
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<User, ProfileServiceError> {
        let email = input.email.trim();
        let full_name = input.full_name.trim();

        if email.is_empty() || full_name.is_empty() {
            return Err(ProfileServiceError::ValidationError(
                "Email and full name are required".to_string(),
            ));
        }

        if !is_valid_email(email) {
            return Err(ProfileServiceError::ValidationError(
                "Please provide a valid email address".to_string(),
            ));
        }

        if self
            .users
            .find_by_email_excluding(email, user_id)
            .await?
            .is_some()
        {
            return Err(ProfileServiceError::EmailInUse);
        }

        match self.users.update_profile(user_id, email, full_name).await {
            Ok(Some(user)) => {
                tracing::info!(user_id, "Profile updated");
                Ok(user)
            }
            Ok(None) => Err(ProfileServiceError::UserNotFound),
            Err(e) if is_unique_violation(&e) => Err(ProfileServiceError::EmailInUse),
            Err(e) => Err(ProfileServiceError::InternalError(e)),
        }
    }
}
