//! HTTP server

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppContext, AppState};
use crate::config::Settings;
use crate::engine::EngineConnector;

/// Build the API router around a handler context
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = Router::new()
        .route("/create_slave", post(handlers::create_slave))
        .route("/list_slave", get(handlers::list_slave))
        .route("/stop_slave_by_id", post(handlers::stop_slave_by_id))
        .route("/remove_slave_by_id", delete(handlers::remove_slave_by_id))
        .route("/stop_slave_by_name", post(handlers::stop_slave_by_name))
        .route("/remove_slave_by_name", delete(handlers::remove_slave_by_name))
        .route("/stop_all_slave", post(handlers::stop_all_slave))
        .route("/remove_all_slave", delete(handlers::remove_all_slave));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// HTTP API Server
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Create a new server
    pub fn new(settings: &Settings, connector: Arc<dyn EngineConnector>, addr: SocketAddr) -> Self {
        let state: AppState = Arc::new(AppContext {
            connector,
            default_connection: settings.engine.default_connection.clone(),
            image_prefix: settings.workers.image_prefix.clone(),
        });

        Self {
            router: router(state),
            addr,
        }
    }

    /// Run the server until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
