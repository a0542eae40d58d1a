//! Core data models for the upload gateway.
//!
//! These entities cover upload records, principals, and their sessions.
//! They map cleanly to database tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod session;
pub mod upload;
pub mod user;
