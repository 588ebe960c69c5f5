use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use blogvcs_service::VersionControl;
use blogvcs_store::JournalVersionStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// blogvcs HTTP server.
pub struct BlogServer {
    config: ServerConfig,
    state: AppState,
}

impl BlogServer {
    pub fn new(config: ServerConfig, service: VersionControl) -> Self {
        Self {
            config,
            state: AppState::new(service),
        }
    }

    /// Open the journal named by the configuration and serve from it.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let store = JournalVersionStore::open_with(&config.store_path, config.sync_mode)?;
        let service = VersionControl::with_config(Arc::new(store), config.service.clone());
        Ok(Self::new(config, service))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router, with CORS when origins are configured.
    pub fn router(&self) -> ServerResult<axum::Router> {
        let router = build_router(self.state.clone());
        if self.config.cors_origins.is_empty() {
            return Ok(router);
        }
        let origins = self
            .config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| ServerError::Config(format!("invalid CORS origin {o:?}: {e}")))
            })
            .collect::<ServerResult<Vec<_>>>()?;
        let cors = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        Ok(router.layer(cors))
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "blogvcs server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
