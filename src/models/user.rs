//! User model
//!
//! A registered account. The password hash is stored alongside the profile
//! fields but never leaves the process: it is skipped on serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
///
/// Serialized with camelCase keys and the id under `_id`, which is what the
/// browser client reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier, assigned by the store
    #[serde(rename = "_id")]
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Password hash (argon2id PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, not yet persisted user.
    ///
    /// The password must already be hashed; see `services::password::hash_password`.
    pub fn new(username: String, email: String, full_name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            full_name,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration input, before validation and hashing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Profile update input. Username and password are not mutable here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileInput {
    pub email: String,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "testuser".to_string(),
            "test@example.com".to_string(),
            "Test User".to_string(),
            "hashed_password".to_string(),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.full_name, "Test User");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let mut user = User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "Alice Liddell".to_string(),
            "$argon2id$v=19$secret".to_string(),
        );
        user.id = 7;

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], 7);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["fullName"], "Alice Liddell");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_register_input_missing_fields_default_to_empty() {
        let input: RegisterInput =
            serde_json::from_str(r#"{"username":"bob","fullName":"Bob"}"#).unwrap();
        assert_eq!(input.username, "bob");
        assert_eq!(input.full_name, "Bob");
        assert!(input.email.is_empty());
        assert!(input.password.is_empty());
    }
}
