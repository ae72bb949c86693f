//! Apples server: REST API over an in-memory apple collection, with OpenAPI
//! docs and health probes.

pub mod error;
pub mod network;
pub mod openapi;

pub use error::{ApiError, ErrorBody};
pub use network::{build_router, AppState, NetworkConfig, NetworkModule};
