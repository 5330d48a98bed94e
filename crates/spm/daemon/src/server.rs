//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use spm_bindings::{BindingConfig, ProviderRegistry};
use spm_storage::LocalFileStorage;
use std::sync::Arc;
use tokio::net::TcpListener;

/// SPM daemon server
pub struct Server {
    config: DaemonConfig,
    registry: Arc<ProviderRegistry>,
}

impl Server {
    /// Create a server over an explicit binding configuration.
    pub fn new(config: DaemonConfig, bindings: BindingConfig) -> Self {
        let bindings = bindings.with_pool(config.database.pool_settings());
        Self {
            config,
            registry: Arc::new(ProviderRegistry::new(bindings)),
        }
    }

    /// Create a server with bindings resolved from the environment.
    pub fn from_env(config: DaemonConfig) -> DaemonResult<Self> {
        Ok(Self::new(config, BindingConfig::from_env()?))
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Application state over this server's registry and file root
    pub fn state(&self) -> AppState {
        let files = Arc::new(LocalFileStorage::new(self.config.files.root.clone()));
        AppState::new(Arc::clone(&self.registry), files)
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let diagnostics = self.registry.diagnostics()?;
        for warning in &diagnostics.warnings {
            tracing::warn!(%warning, "binding configuration");
        }
        tracing::info!(
            modes = ?diagnostics.modes,
            any_live = diagnostics.any_live,
            "provider bindings resolved"
        );

        let app = create_router(self.state(), &self.config.server);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("SPM daemon listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("SPM daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
