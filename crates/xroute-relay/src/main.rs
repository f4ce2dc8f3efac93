use tracing::info;

use xroute_relay::config::init_logging;
use xroute_relay::{create_router, RelayConfig, RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = RelayConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        timeout_ms = config.timeout_ms,
        allowed_hosts = config.allowed_hosts.len(),
        "Relay config loaded"
    );

    let app = create_router(RelayState::new(&config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("RPC relay listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
