//! API middleware
//!
//! Contains:
//! - `AppState`, the shared services handed to every handler
//! - `ApiError`, the single place where failures become status codes
//! - The access guard (`require_auth`) and the `AuthSession` extractor

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{SqlxSessionRepository, SqlxStudentRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::models::FieldErrors;
use crate::services::{AuthService, ProfileService, SessionManager, StudentService};

/// Message returned by the guard for every unauthenticated request
pub const AUTH_REQUIRED: &str = "Authentication required";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub sessions: Arc<SessionManager>,
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub student_service: Arc<StudentService>,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let sessions = Arc::new(SessionManager::new(
            SqlxSessionRepository::boxed(pool.clone()),
            &config.session,
        )?);

        Ok(Self {
            auth_service: Arc::new(AuthService::new(user_repo.clone(), sessions.clone())),
            profile_service: Arc::new(ProfileService::new(user_repo)),
            student_service: Arc::new(StudentService::new(SqlxStudentRepository::boxed(
                pool.clone(),
            ))),
            sessions,
            static_dir: Arc::new(config.static_dir.clone()),
            pool,
        })
    }
}

/// Identity established by the guard, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
}

/// Error response for API errors.
///
/// Serializes as `{"error": "..."}` or, for per-field failures,
/// `{"errors": {"field": "..."}}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// 400 with a per-field error map
    pub fn field_errors(errors: FieldErrors) -> Self {
        Self {
            code: "VALIDATION_ERROR",
            error: None,
            errors: Some(errors),
        }
    }

    /// Log the full error chain and return a 500 carrying its summary
    pub fn storage(err: &anyhow::Error) -> Self {
        tracing::error!("Storage error: {:#}", err);
        Self::internal_error(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Raw session credential from the request: an `Authorization: Bearer`
/// header, or else the named session cookie.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Session token carried by the request, if present and correctly signed
pub fn verified_session_token(sessions: &SessionManager, headers: &HeaderMap) -> Option<String> {
    let signed = extract_session_token(headers, sessions.cookie_name())?;
    sessions.verify(&signed)
}

/// Access guard.
///
/// Rejects with 401 unless the request carries a signed token for a live
/// session. On success the `AuthSession` is placed in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = verified_session_token(&state.sessions, request.headers())
        .ok_or_else(|| ApiError::unauthorized(AUTH_REQUIRED))?;

    let session = state
        .sessions
        .resolve(&token)
        .await
        .map_err(|e| ApiError::storage(&e))?
        .ok_or_else(|| ApiError::unauthorized(AUTH_REQUIRED))?;

    request.extensions_mut().insert(AuthSession {
        token,
        user_id: session.user_id,
    });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(AUTH_REQUIRED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer test-token-123")]);
        assert_eq!(
            extract_session_token(&h, "sid"),
            Some("test-token-123".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let h = headers(&[(header::COOKIE, "theme=dark; sid=abc.def; other=1")]);
        assert_eq!(extract_session_token(&h, "sid"), Some("abc.def".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer bearer-token"),
            (header::COOKIE, "sid=cookie-token"),
        ]);
        assert_eq!(
            extract_session_token(&h, "sid"),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new(), "sid").is_none());

        let h = headers(&[(header::AUTHORIZATION, "Basic invalid")]);
        assert!(extract_session_token(&h, "sid").is_none());

        let h = headers(&[(header::COOKIE, "sidx=nope; sid=")]);
        assert!(extract_session_token(&h, "sid").is_none());
    }

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(
            ApiError::unauthorized("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::validation_error("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::field_errors(FieldErrors::single("name", "Name is required")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_shapes() {
        let single = serde_json::to_value(ApiError::unauthorized(AUTH_REQUIRED)).unwrap();
        assert_eq!(single, serde_json::json!({ "error": "Authentication required" }));

        let fields = serde_json::to_value(ApiError::field_errors(FieldErrors::single(
            "registrationNumber",
            "Registration number already exists",
        )))
        .unwrap();
        assert_eq!(
            fields,
            serde_json::json!({
                "errors": { "registrationNumber": "Registration number already exists" }
            })
        );
    }
}
