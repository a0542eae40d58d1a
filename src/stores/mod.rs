//! Persistence interfaces and their SQLite implementations.
//!
//! Services depend on the traits only; the SQLite types are wired in at
//! construction time so tests can substitute in-memory fakes.

pub mod sessions;
pub mod upload_records;
pub mod users;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
