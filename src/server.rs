//! API server — wiring, startup banner and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::{AppState, create_router};
use crate::auth::{AuthService, TokenBlacklist, TokenService, spawn_sweeper};
use crate::config::Config;
use crate::store::Store;
use crate::{Error, Result};

/// University API server
pub struct Server {
    /// Configuration
    config: Config,
    /// Persistence port
    store: Arc<dyn Store>,
}

impl Server {
    /// Create a new server over the given store.
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        // Shutdown channel shared by the sweeper and the signal handler
        let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);

        let secret = self.config.auth.resolve_secret_key();
        let tokens = TokenService::new(&secret, self.config.auth.token_ttl);

        let blacklist = Arc::new(TokenBlacklist::new());
        spawn_sweeper(
            Arc::clone(&blacklist),
            self.config.auth.sweep_interval,
            shutdown_tx.subscribe(),
        );

        let auth = Arc::new(AuthService::new(
            tokens,
            blacklist,
            Arc::clone(&self.store),
        ));

        let state = Arc::new(AppState::new(Arc::clone(&self.store), Arc::clone(&auth)));
        let app = create_router(state, &self.config.auth);

        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("UNIVERSITY API v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = %self.config.server.port, "Listening");

        if self.config.auth.enabled {
            info!(
                "AUTHENTICATION enabled (protected groups: {:?}, token ttl: {:?})",
                self.config.auth.protected, self.config.auth.token_ttl
            );
        } else {
            warn!("AUTHENTICATION disabled - all write routes are open");
        }

        info!("Entity routes:");
        for entity in crate::store::Entity::ALL {
            info!("  /{}", entity.path());
        }
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_tx))
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
