//! Data models
//!
//! Database entities (User, Session, Student) and the request payloads that
//! feed them.

mod session;
mod student;
mod user;

pub use session::Session;
pub use student::{FieldErrors, Student, StudentFields, StudentInput};
pub use user::{RegisterInput, UpdateProfileInput, User};
