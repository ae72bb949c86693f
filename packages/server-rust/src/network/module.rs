//! Network module with deferred startup lifecycle.
//!
//! `new()` creates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until shutdown. Callers can seed or inspect
//! the store through [`NetworkModule::state`] between `new()` and `serve()`.

use std::future::Future;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::config::NetworkConfig;
use super::handlers::{
    create_apple, delete_apple, get_apple, head_apple, health_handler, list_apples,
    liveness_handler, not_found_handler, patch_apple, readiness_handler, replace_apple, AppState,
};
use super::middleware::with_http_layers;
use crate::openapi::docs_router;

/// Assembles the full application router.
///
/// Routes (all below `config.path_prefix`):
/// - `GET /health`, `GET /health/live`, `GET /health/ready`
/// - `GET|POST /apples`
/// - `GET|HEAD|PUT|PATCH|DELETE /apples/{name}`
/// - `GET /docs` (Swagger UI) and `GET /api-docs/openapi.json`
pub fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let prefix = config.normalized_prefix();

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/apples", get(list_apples).post(create_apple))
        .route(
            "/apples/{name}",
            get(get_apple)
                .head(head_apple)
                .put(replace_apple)
                .patch(patch_apple)
                .delete(delete_apple),
        );

    let routes = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    let router = routes
        .merge(docs_router(&prefix))
        .fallback(not_found_handler)
        .with_state(state);

    with_http_layers(router, config)
}

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a module around an empty store without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self::with_state(config, AppState::new())
    }

    #[must_use]
    pub fn with_state(config: NetworkConfig, state: AppState) -> Self {
        Self {
            config,
            listener: None,
            state,
        }
    }

    /// Shared application state (store and shutdown controller).
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured one
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `signal` resolves or the shutdown controller is
    /// triggered, then lets in-flight requests finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(self, signal: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let listener = self
            .listener
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let port = listener.local_addr()?.port();
        let router = build_router(self.state.clone(), &self.config);
        let shutdown = self.state.shutdown;

        shutdown.set_ready();
        info!("API docs at {}", self.config.docs_url(port));

        let graceful = {
            let shutdown = shutdown.clone();
            async move {
                tokio::select! {
                    () = signal => {}
                    () = shutdown.wait_for_shutdown() => {}
                }
                info!("Shutdown requested, draining requests");
                shutdown.trigger_shutdown();
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(graceful)
            .await?;

        shutdown.mark_stopped();
        info!("Server stopped");
        Ok(())
    }
}
