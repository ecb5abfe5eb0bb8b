//! Student record service
//!
//! Validated CRUD over student records. Validation reports every failing
//! field at once, keyed by the JSON field name. Registration number
//! uniqueness comes from the store: the service writes and translates a
//! unique violation into a field error, it never pre-checks.

use crate::db::repositories::{is_unique_violation, StudentRepository};
use crate::models::{FieldErrors, Student, StudentFields, StudentInput};
use std::sync::Arc;

const REGISTRATION_NUMBER_TAKEN: &str = "Registration number already exists";

#[derive(Debug, thiserror::Error)]
pub enum StudentServiceError {
    /// Per-field validation or conflict failures
    #[error("Invalid student: {0}")]
    FieldErrors(FieldErrors),

    #[error("Student not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Trim every field and check that none is empty.
///
/// Returns all failures together rather than stopping at the first.
pub fn validate_student(input: &StudentInput) -> Result<StudentFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut required = |field: &'static str, value: &Option<String>, message: &str| {
        let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            errors.insert(field, message);
        }
        trimmed.to_string()
    };

    let fields = StudentFields {
        name: required("name", &input.name, "Name is required"),
        registration_number: required(
            "registrationNumber",
            &input.registration_number,
            "Registration number is required",
        ),
        email: required("email", &input.email, "Email is required"),
        phone: required("phone", &input.phone, "Phone is required"),
        address: required("address", &input.address, "Address is required"),
    };

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

pub struct StudentService {
    repo: Arc<dyn StudentRepository>,
}

impl StudentService {
    pub fn new(repo: Arc<dyn StudentRepository>) -> Self {
        Self { repo }
    }

    /// All records, newest first
    pub async fn list(&self) -> Result<Vec<Student>, StudentServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Student, StudentServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(StudentServiceError::NotFound)
    }

    pub async fn create(
        &self,
        input: StudentInput,
        created_by: i64,
    ) -> Result<Student, StudentServiceError> {
        let fields = validate_student(&input).map_err(StudentServiceError::FieldErrors)?;

        let student = self
            .repo
            .create(&fields, Some(created_by))
            .await
            .map_err(map_write_error)?;

        tracing::info!(
            student_id = student.id,
            created_by,
            "Student record created"
        );
        Ok(student)
    }

    /// Replace all business fields; `createdAt` and `createdBy` are kept
    pub async fn update(&self, id: i64, input: StudentInput) -> Result<Student, StudentServiceError> {
        let fields = validate_student(&input).map_err(StudentServiceError::FieldErrors)?;

        self.repo
            .update(id, &fields)
            .await
            .map_err(map_write_error)?
            .ok_or(StudentServiceError::NotFound)
    }

    /// Hard delete. Any signed-in user may delete any record.
    pub async fn delete(&self, id: i64) -> Result<(), StudentServiceError> {
        if !self.repo.delete(id).await? {
            return Err(StudentServiceError::NotFound);
        }
        tracing::info!(student_id = id, "Student record deleted");
        Ok(())
    }
}

fn map_write_error(err: anyhow::Error) -> StudentServiceError {
    if is_unique_violation(&err) {
        StudentServiceError::FieldErrors(FieldErrors::single(
            "registrationNumber",
            REGISTRATION_NUMBER_TAKEN,
        ))
    } else {
        StudentServiceError::InternalError(err)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn optional_field() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("   ".to_string())),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Some),
        ]
    }

    fn is_blank(value: &Option<String>) -> bool {
        value.as_deref().map(str::trim).unwrap_or_default().is_empty()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Exactly the blank fields are reported.
        #[test]
        fn validation_reports_exactly_blank_fields(
            name in optional_field(),
            registration_number in optional_field(),
            email in optional_field(),
            phone in optional_field(),
            address in optional_field(),
        ) {
            let input = StudentInput { name, registration_number, email, phone, address };
            let expected: Vec<&str> = [
                ("name", &input.name),
                ("registrationNumber", &input.registration_number),
                ("email", &input.email),
                ("phone", &input.phone),
                ("address", &input.address),
            ]
            .into_iter()
            .filter(|(_, value)| is_blank(value))
            .map(|(field, _)| field)
            .collect();

            match validate_student(&input) {
                Ok(fields) => {
                    prop_assert!(expected.is_empty());
                    prop_assert_eq!(fields.name.trim(), fields.name.as_str());
                }
                Err(errors) => {
                    prop_assert_eq!(errors.len(), expected.len());
                    for field in expected {
                        prop_assert!(errors.contains(field));
                    }
                }
            }
        }
    }
}
