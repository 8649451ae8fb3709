//! HTTP front end for rollcall.
//!
//! A thin axum layer over [`Registry`]: it parses forms, runs registry calls
//! on the blocking pool, and turns every outcome into a page or a redirect
//! with a flash notice.

pub mod flash;
pub mod routes;
pub mod views;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::registry::Registry;

use self::flash::FlashSigner;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// The record service.
    pub registry: Registry,
    /// Signs flash notices.
    pub flash: FlashSigner,
}

impl AppState {
    /// Bundle a registry and a flash signer.
    #[must_use]
    pub fn new(registry: Registry, flash: FlashSigner) -> Self {
        Self { registry, flash }
    }
}

/// Build the application router.
///
/// Files under `static_dir` are served at `/static`.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/add", post(routes::add_student))
        .route(
            "/edit/{roll_no}",
            get(routes::edit_form).post(routes::edit_student),
        )
        .route("/delete/{roll_no}", post(routes::delete_student))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the web UI until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the bind address is invalid or the listener fails.
pub async fn serve(registry: Registry, config: &Config) -> Result<()> {
    let addr: SocketAddr = config.bind_addr()?;

    let signer = if let Some(secret) = config.server.secret_key.as_deref() {
        FlashSigner::new(secret)
    } else {
        warn!("No server.secret_key configured, notices will not survive a restart");
        FlashSigner::random()
    };

    let state = Arc::new(AppState::new(registry, signer));
    let app = router(state, &config.server.static_dir);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, starting shutdown"),
        () = terminate => info!("Received SIGTERM, starting shutdown"),
    }
}
