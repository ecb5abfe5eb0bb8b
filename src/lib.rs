//! Student Records - session-authenticated student record keeping
//!
//! Users register and sign in; signed-in users manage their own profile and
//! a shared list of student records over a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
