//! HTTP boundary for [`gitcms`]: delete, create, upload, commit, reset and
//! show over one working tree.

pub mod config;
pub mod error;
pub mod routes;
pub mod upload;

pub use config::{Args, RouterOptions};
pub use error::ApiError;
pub use routes::{router, AppState};

use tokio::net::TcpListener;

/// Serve `app` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: axum::Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; shutting down");
        return;
    }
    tracing::info!("shutting down");
}
