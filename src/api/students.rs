//! Student record API endpoints
//!
//! Handles HTTP requests for student records:
//! - GET /api/students - List all records, newest first
//! - GET /api/students/{id} - Get one record
//! - POST /api/students - Create a record owned by the caller
//! - PUT /api/students/{id} - Replace a record's fields
//! - DELETE /api/students/{id} - Delete a record
//!
//! Every route sits behind the access guard. Any signed-in user may read,
//! change or delete any record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthSession};
use crate::models::{Student, StudentInput};
use crate::services::StudentServiceError;

const STUDENT_NOT_FOUND: &str = "Student not found";

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

impl From<StudentServiceError> for ApiError {
    fn from(err: StudentServiceError) -> Self {
        match err {
            StudentServiceError::FieldErrors(errors) => ApiError::field_errors(errors),
            StudentServiceError::NotFound => ApiError::not_found(STUDENT_NOT_FOUND),
            StudentServiceError::InternalError(e) => ApiError::storage(&e),
        }
    }
}

/// Build student routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}

/// Ids are numeric; anything else cannot name a record
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found(STUDENT_NOT_FOUND))
}

/// GET /api/students
async fn list_students(
    State(state): State<AppState>,
    _auth: AuthSession,
) -> Result<Json<Vec<Student>>, ApiError> {
    Ok(Json(state.student_service.list().await?))
}

/// GET /api/students/{id}
async fn get_student(
    State(state): State<AppState>,
    _auth: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.student_service.get(id).await?))
}

/// POST /api/students
async fn create_student(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(body): Json<StudentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.student_service.create(body, auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// PUT /api/students/{id}
async fn update_student(
    State(state): State<AppState>,
    _auth: AuthSession,
    Path(id): Path<String>,
    Json(body): Json<StudentInput>,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.student_service.update(id, body).await?))
}

/// DELETE /api/students/{id}
async fn delete_student(
    State(state): State<AppState>,
    _auth: AuthSession,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_id(&id)?;
    state.student_service.delete(id).await?;
    Ok(Json(DeletedResponse {
        message: "Student deleted successfully",
    }))
}
