use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use super::{create_router, AppState};
use crate::engine::Environments;
use crate::error::{MirrorError, Result};

/// Serve the mirror API until `shutdown` resolves
pub async fn start_api_server<F>(
    environments: Arc<Environments>,
    bind_address: &str,
    port: u16,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState::new(environments));

    let addr: SocketAddr = format!("{bind_address}:{port}")
        .parse()
        .map_err(|e| MirrorError::InvalidConfig(format!("server.bind_address: {e}")))?;
    info!("API server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
