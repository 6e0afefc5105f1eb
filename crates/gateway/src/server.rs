/// Gateway HTTP server lifecycle
use crate::api::routes::{create_router, AppState};
use anyhow::Result;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Owns the listening socket and the serve task.
pub struct GatewayServer {
    addr: SocketAddr,
    state: AppState,
    server_handle: Option<JoinHandle<()>>,
}

impl GatewayServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            state,
            server_handle: None,
        }
    }

    /// Bind and start serving. Failure to bind is fatal to startup and
    /// propagates to the caller.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting gateway server on {}", self.addr);

        let app = create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        // Resolve the actual port when bound to :0.
        self.addr = listener.local_addr()?;
        info!("Gateway listening on {}", self.addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Gateway server error: {e}");
            }
        });

        self.server_handle = Some(handle);
        Ok(())
    }

    /// Stop serving.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            info!("Stopping gateway server");
            handle.abort();
        }
    }

    /// The bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for GatewayServer {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}
