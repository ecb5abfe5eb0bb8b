//! Services layer - Business logic
//!
//! Services enforce validation and business rules and translate repository
//! failures into their own error enums, which the API layer maps to HTTP.

pub mod auth;
pub mod password;
pub mod profile;
pub mod session;
pub mod student;

pub use auth::{is_valid_email, AuthService, AuthServiceError};
pub use password::{hash_password, verify_password};
pub use profile::{ProfileService, ProfileServiceError};
pub use session::SessionManager;
pub use student::{validate_student, StudentService, StudentServiceError};
