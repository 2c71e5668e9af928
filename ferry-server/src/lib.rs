//! HTTP surface for the lead-export pipeline.
//!
//! Two operations are exposed: placing a lead-search order and fetching
//! a finished export. Fetching is deliberately soft: while the vendor is
//! still generating the file the endpoint answers `202 Accepted` with a
//! machine-readable reason, so callers poll instead of treating a slow
//! export as a failure.

mod routes;
mod service;

pub use routes::{CreateOrderRequest, FetchExportRequest, ProcessingResponse};
pub use service::{BrowserExportService, ExportService};

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub type ServiceHandle = Arc<dyn ExportService>;

/// A running HTTP server with a graceful-shutdown handle.
pub struct FerryServer {
    port: u16,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FerryServer {
    /// Bind `host:port` (port 0 picks a free one) and start serving.
    pub async fn start(host: &str, port: u16, service: ServiceHandle) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = Router::new()
            .route("/orders", post(routes::create_order))
            .route("/exports", post(routes::fetch_export))
            .route("/health", get(routes::health))
            .with_state(service);

        info!(target: "server", %host, port, "listening");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// The port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shut the server down gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
