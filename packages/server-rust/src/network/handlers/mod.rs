//! HTTP handler definitions for the Apples server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod apples;
pub mod health;

pub use apples::{
    create_apple, delete_apple, get_apple, head_apple, list_apples, patch_apple, replace_apple,
};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;

use apples_core::AppleStore;
use parking_lot::Mutex;

use super::ShutdownController;
use crate::error::ApiError;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Cloning is cheap: every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The apple collection. Store writes are check-then-act, so every call
    /// runs under this one lock.
    pub store: Arc<Mutex<AppleStore>>,
    /// Health state and shutdown trigger.
    pub shutdown: Arc<ShutdownController>,
}

impl AppState {
    /// State around an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(AppleStore::new())
    }

    #[must_use]
    pub fn with_store(store: AppleStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            shutdown: Arc::new(ShutdownController::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::RouteNotFound
}
