//! Wall Server - HTTP surface for the community wall
//!
//! - [`config`]: layered configuration (defaults, TOML, env, flags)
//! - [`services`]: submissions, moderation, engagements, leaderboard
//! - [`http`]: axum router, request/response bodies, handlers
//! - [`error`]: service and API errors, mapped to fixed client messages
//!
//! # Example
//!
//! ```rust,ignore
//! use wall_server::{build_state, config::ServerConfig, http::router, serve};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::new().with_database_url("sqlite::memory:");
//! let state = build_state(&config).await?;
//! let app = router(state, config.body_limit_bytes);
//! let listener = tokio::net::TcpListener::bind(config.bind).await?;
//! serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod services;

pub use config::{CliArgs, ServerConfig};
pub use error::{ApiError, ServiceError, StartupError};
pub use services::AppState;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use wall_imagen::ImageFilterGateway;
use wall_store::SqliteStore;

/// Open the store and build the gateway described by `config`
///
/// # Errors
/// `StartupError::Store` if the database cannot be opened or migrated,
/// `StartupError::Gateway` if the HTTP client cannot be built
pub async fn build_state(config: &ServerConfig) -> Result<AppState, StartupError> {
    let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
    let gateway = ImageFilterGateway::from_config(config.imagen.clone())?;

    if config.imagen.project().is_none() {
        warn!("GOOGLE_CLOUD_PROJECT_ID not set, /apply-filter will fail");
    }

    Ok(AppState::new(Arc::new(store), Arc::new(gateway)))
}

/// Serve `app` until Ctrl+C or SIGTERM
///
/// # Errors
/// Propagates I/O errors from the accept loop
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!(%address, "server running");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
