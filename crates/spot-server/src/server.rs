use std::sync::Arc;

use spot_registry::{GarageRegistry, StalenessSweeper};
use spot_store::{GarageStore, InMemoryGarageStore, JsonFileStore};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::{ServerConfig, StoreConfig};
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Spot HTTP server.
pub struct SpotServer {
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
}

impl SpotServer {
    /// Open the configured store and rehydrate the registry from it.
    pub async fn bootstrap(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = open_store(&config.store).await?;
        let registry =
            GarageRegistry::load(store, config.registry.registry_config()).await?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    pub fn with_registry(config: ServerConfig, registry: Arc<GarageRegistry>) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            config,
            state: Arc::new(AppState::new(registry, tx)),
            shutdown: rx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<GarageRegistry> {
        &self.state.registry
    }

    /// Shared state; [`AppState::request_shutdown`] stops a running server.
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), &self.config.api_version)
    }

    /// Bind the configured address and serve until shut down.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// Runs the staleness sweeper alongside. A control request or Ctrl-C
    /// stops the sweeper first, then drains in-flight requests.
    pub async fn run(self, listener: TcpListener) -> ServerResult<()> {
        let app = self.router();
        let sweeper = StalenessSweeper::start(
            self.state.registry.clone(),
            self.config.registry.sweeper_config(),
        );
        info!(addr = %listener.local_addr()?, "spot server listening");

        let shutdown = self.shutdown;
        let signal = async move {
            tokio::select! {
                _ = stop_requested(shutdown) => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        warn!(error = %e, "failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                    info!("received ctrl-c");
                }
            }
            sweeper.stop().await;
            info!("shutting down http server");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("http server stopped");
        Ok(())
    }
}

async fn stop_requested(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // sender gone: only ctrl-c can stop us now
        std::future::pending::<()>().await;
    }
}

async fn open_store(config: &StoreConfig) -> ServerResult<Arc<dyn GarageStore>> {
    let store: Arc<dyn GarageStore> = match config {
        StoreConfig::File { path } => Arc::new(JsonFileStore::open(path).await?),
        StoreConfig::Memory => {
            warn!("using in-memory store; the catalog will not survive a restart");
            Arc::new(InMemoryGarageStore::new())
        }
    };
    Ok(store)
}
