//! Profile API endpoints
//!
//! - GET /api/users/profile - The signed-in user's profile
//! - PUT /api/users/profile - Update email and full name
//!
//! Both routes sit behind the access guard.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::auth::UserEnvelope;
use crate::api::middleware::{ApiError, AppState, AuthSession};
use crate::models::{UpdateProfileInput, User};
use crate::services::ProfileServiceError;

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: User,
}

impl From<ProfileServiceError> for ApiError {
    fn from(err: ProfileServiceError) -> Self {
        match err {
            ProfileServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ProfileServiceError::EmailInUse => ApiError::validation_error(err.to_string()),
            ProfileServiceError::UserNotFound => ApiError::not_found(err.to_string()),
            ProfileServiceError::InternalError(e) => ApiError::storage(&e),
        }
    }
}

/// Build profile routes
pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

/// GET /api/users/profile
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.profile_service.get_profile(auth.user_id).await?;
    Ok(Json(UserEnvelope { user }))
}

/// PUT /api/users/profile
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<ProfileUpdatedResponse>, ApiError> {
    let user = state
        .profile_service
        .update_profile(auth.user_id, body)
        .await?;

    Ok(Json(ProfileUpdatedResponse {
        message: "Profile updated successfully",
        user,
    }))
}
