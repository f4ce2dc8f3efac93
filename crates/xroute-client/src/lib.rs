//! Routing API client and transaction status polling.
//!
//! - `api_client`: `SkipClient`, the HTTP implementation of the catalog and
//!   route provider traits
//! - `wait_for_final_status`: bounded polling of a tracked transaction

pub mod api_client;

use std::time::Duration;

use tracing::{debug, warn};
use xroute_provider::RouteProvider;
use xroute_types::{Result, TxInfo, TxStatus, XrouteError};

pub use api_client::SkipClient;

/// Routing API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub slippage_tolerance_percent: String,
    pub status_poll_ms: u64,
    pub max_status_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.skip.money".to_string(),
            api_key: None,
            request_timeout_ms: 20_000,
            slippage_tolerance_percent: "1".to_string(),
            status_poll_ms: 1_000,
            max_status_attempts: 120,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `XROUTE_API_URL`, `XROUTE_API_KEY` and
    /// `XROUTE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `var`.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = var("XROUTE_API_URL") {
            config.api_url = url;
        }
        if let Some(key) = var("XROUTE_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Some(timeout) = var("XROUTE_TIMEOUT_MS") {
            config.request_timeout_ms = timeout
                .parse()
                .map_err(|_| XrouteError::Other(format!("invalid XROUTE_TIMEOUT_MS: {}", timeout)))?;
        }
        Ok(config)
    }
}

/// Poll `tx` until its state is final, waiting `poll_interval_ms` between
/// attempts.
pub async fn wait_for_final_status<R: RouteProvider + ?Sized>(
    router: &R,
    tx: &TxInfo,
    max_attempts: u32,
    poll_interval_ms: u64,
) -> Result<TxStatus> {
    for attempt in 0..max_attempts {
        match router.transaction_status(tx).await {
            Ok(status) if status.state.is_final() => return Ok(status),
            Ok(status) => {
                debug!(tx_hash = %tx.tx_hash, attempt, state = ?status.state, "transaction pending");
            }
            Err(e) => {
                warn!(tx_hash = %tx.tx_hash, attempt, error = %e, "status check failed");
            }
        }
        if attempt + 1 < max_attempts {
            tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
        }
    }
    Err(XrouteError::Timeout(format!(
        "transaction {} on {} not final after {} attempts",
        tx.tx_hash, tx.chain_id, max_attempts
    )))
}
