//! Student record model
//!
//! Satisfies the record shape read by the browser client: camelCase keys,
//! id under `_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored student record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    /// Registration number (unique)
    pub registration_number: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Id of the user that created the record; `None` once that user is gone
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw create/update payload.
///
/// Every field is optional so that a missing or `null` field is reported as
/// a validation error for that field instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInput {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Validated business fields, trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFields {
    pub name: String,
    pub registration_number: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Per-field error messages, keyed by the JSON field name.
///
/// Serializes as a plain object, e.g. `{"name": "Name is required"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error map with a single entry
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_serializes_camel_case_with_id() {
        let now = Utc::now();
        let student = Student {
            id: 3,
            name: "Ann".to_string(),
            registration_number: "R100".to_string(),
            email: "ann@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Main St".to_string(),
            created_by: Some(1),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["_id"], 3);
        assert_eq!(json["registrationNumber"], "R100");
        assert_eq!(json["createdBy"], 1);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("registration_number").is_none());
    }

    #[test]
    fn test_student_input_accepts_nulls_and_missing_fields() {
        let input: StudentInput =
            serde_json::from_str(r#"{"name": null, "registrationNumber": "R1"}"#).unwrap();
        assert_eq!(input.name, None);
        assert_eq!(input.registration_number.as_deref(), Some("R1"));
        assert_eq!(input.address, None);
    }

    #[test]
    fn test_field_errors_serialize_as_object() {
        let mut errors = FieldErrors::new();
        errors.insert("name", "Name is required");
        errors.insert("address", "Address is required");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["name"], "Name is required");
        assert_eq!(json["address"], "Address is required");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.to_string(), "Address is required, Name is required");
    }
}
