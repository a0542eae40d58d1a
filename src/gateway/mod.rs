//! Object store gateway — the seam between the orchestrator and the blob store.

pub mod object_store;

pub use object_store::{GatewayError, GatewayResult, ObjectStoreGateway, S3Gateway};
