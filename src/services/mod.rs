//! Core services: the multipart upload orchestrator and the session manager,
//! plus the token and password capabilities they are built on.

pub mod auth_service;
pub mod password;
pub mod tokens;
pub mod upload_service;
