//! Authentication API endpoints
//!
//! Handles HTTP requests for account and session management:
//! - POST /api/auth/register - Create an account
//! - POST /api/auth/login - Open a session and set the session cookie
//! - POST /api/auth/logout - Destroy the session and clear the cookie
//! - GET /api/auth/me - The user behind the current session
//!
//! None of these sit behind the access guard. `me` checks the session
//! itself so it can tell "not signed in" apart from "account gone".

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{verified_session_token, ApiError, AppState};
use crate::models::{RegisterInput, User};
use crate::services::AuthServiceError;

/// Request body for login. Missing fields read as empty and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `{message, user}` body shared by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: User,
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::Conflict => ApiError::validation_error(err.to_string()),
            AuthServiceError::InvalidCredentials | AuthServiceError::NotAuthenticated => {
                ApiError::unauthorized(err.to_string())
            }
            AuthServiceError::UserNotFound => ApiError::not_found(err.to_string()),
            AuthServiceError::LogoutFailed(ref source) => {
                tracing::error!("Logout failed: {:#}", source);
                ApiError::internal_error(err.to_string())
            }
            AuthServiceError::InternalError(e) => ApiError::storage(&e),
        }
    }
}

/// Build auth routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// POST /api/auth/register - Create an account
///
/// Does not sign the new user in.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// POST /api/auth/login - Check credentials, open a session
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .auth_service
        .login(&body.username, &body.password)
        .await?;

    let cookie = state.sessions.cookie(&session);
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))?,
    );

    Ok((
        response_headers,
        Json(AuthResponse {
            message: "Login successful",
            user,
        }),
    ))
}

/// POST /api/auth/logout - Destroy the current session, if any
///
/// Succeeds without a session as well; the cookie is cleared either way.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = verified_session_token(&state.sessions, &headers);
    state.auth_service.logout(token.as_deref()).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&state.sessions.clear_cookie())
            .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))?,
    );

    Ok((
        response_headers,
        Json(MessageResponse {
            message: "Logout successful",
        }),
    ))
}

/// GET /api/auth/me - Current user
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserEnvelope>, ApiError> {
    let token = verified_session_token(&state.sessions, &headers);
    let user = state.auth_service.me(token.as_deref()).await?;
    Ok(Json(UserEnvelope { user }))
}
