use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    /// Hosts the relay may forward to. Empty accepts any host.
    pub allowed_hosts: Vec<String>,
    /// Browser origins allowed to read relay responses. Empty allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            timeout_ms: 30_000,
            allowed_hosts: Vec::new(),
            allowed_origins: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Read `HOST`, `PORT`, `RELAY_TIMEOUT_MS`, `RELAY_ALLOWED_HOSTS` and
    /// `RELAY_ALLOWED_ORIGINS` (both comma separated), after loading `.env`
    /// when present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(host) = env::var("HOST") {
            host.parse::<std::net::IpAddr>()
                .with_context(|| format!("invalid HOST: {}", host))?;
            config.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.port = port.parse().with_context(|| format!("invalid PORT: {}", port))?;
        }
        if let Ok(timeout) = env::var("RELAY_TIMEOUT_MS") {
            config.timeout_ms = timeout
                .parse()
                .with_context(|| format!("invalid RELAY_TIMEOUT_MS: {}", timeout))?;
            anyhow::ensure!(config.timeout_ms > 0, "RELAY_TIMEOUT_MS must be > 0");
        }
        if let Ok(hosts) = env::var("RELAY_ALLOWED_HOSTS") {
            config.allowed_hosts = parse_list(&hosts);
        }
        if let Ok(origins) = env::var("RELAY_ALLOWED_ORIGINS") {
            config.allowed_origins = parse_list(&origins);
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

/// Filter used when `RUST_LOG` is unset: relay lifecycle and request
/// rejections, warnings from dependencies.
pub const DEFAULT_LOG_FILTER: &str = "warn,xroute_relay=info";

/// Initialize tracing with `RUST_LOG`, falling back to `DEFAULT_LOG_FILTER`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE),
    );

    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }
}
