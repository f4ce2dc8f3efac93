//! RPC relay: forwards browser RPC calls to chain nodes.
//!
//! `ANY /api/rpc?endpoint=<node url>` forwards the request method and body
//! to `<node url>` and returns the node's status, content type and body
//! unchanged. No transformation happens here. Browser preflight requests
//! are answered locally with the configured CORS origins.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

pub use config::RelayConfig;

/// Relay errors, mapped to HTTP statuses.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing endpoint query parameter")]
    MissingEndpoint,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("endpoint host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingEndpoint | RelayError::InvalidEndpoint(_) => StatusCode::BAD_REQUEST,
            RelayError::HostNotAllowed(_) => StatusCode::FORBIDDEN,
            RelayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Shared relay state.
#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    allowed_hosts: Arc<Vec<String>>,
    allowed_origins: Arc<Vec<HeaderValue>>,
}

impl RelayState {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .unwrap_or_default(),
            allowed_hosts: Arc::new(
                config
                    .allowed_hosts
                    .iter()
                    .map(|h| h.to_ascii_lowercase())
                    .collect(),
            ),
            allowed_origins: Arc::new(
                config
                    .allowed_origins
                    .iter()
                    .filter_map(|origin| match HeaderValue::from_str(origin) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(%origin, "ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Parse `endpoint` and check it against the scheme and host rules.
    /// An empty allowlist accepts every host.
    pub fn check_endpoint(&self, endpoint: &str) -> Result<Url, RelayError> {
        let url = Url::parse(endpoint).map_err(|e| RelayError::InvalidEndpoint(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidEndpoint(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| RelayError::InvalidEndpoint("endpoint has no host".into()))?
            .to_ascii_lowercase();

        if !self.allowed_hosts.is_empty() && !self.allowed_hosts.contains(&host) {
            return Err(RelayError::HostNotAllowed(host));
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
pub struct RelayParams {
    pub endpoint: Option<String>,
}

/// CORS for the relay. An empty origin list allows any origin.
pub fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: RelayState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    Router::new()
        .route("/api/rpc", any(relay_rpc))
        .layer(cors)
        .with_state(state)
}

/// Forward one request to the endpoint named in the query string.
pub async fn relay_rpc(
    State(state): State<RelayState>,
    method: Method,
    Query(params): Query<RelayParams>,
    body: Bytes,
) -> Response {
    match forward(&state, method, params, body).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "relay request rejected");
            e.into_response()
        }
    }
}

async fn forward(
    state: &RelayState,
    method: Method,
    params: RelayParams,
    body: Bytes,
) -> Result<Response, RelayError> {
    let endpoint = params
        .endpoint
        .filter(|e| !e.trim().is_empty())
        .ok_or(RelayError::MissingEndpoint)?;
    let url = state.check_endpoint(&endpoint)?;

    debug!(%method, %url, bytes = body.len(), "relaying rpc request");

    let upstream = state
        .client
        .request(method, url)
        .body(body)
        .send()
        .await
        .map_err(|e| RelayError::Upstream(e.to_string()))?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok());
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| RelayError::Upstream(e.to_string()))?;

    let mut response = (status, bytes).into_response();
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

/// Relayed URL for a chain's RPC endpoint, as handed to the routing SDK.
///
/// `("https://app.example.com", "https://rpc.osmosis.zone")` →
/// `https://app.example.com/api/rpc?endpoint=https%3A%2F%2Frpc.osmosis.zone`
pub fn rpc_endpoint_for_chain(relay_base: &str, rpc: &str) -> Result<String, RelayError> {
    let base = format!("{}/api/rpc", relay_base.trim_end_matches('/'));
    let mut url = Url::parse(&base).map_err(|e| RelayError::InvalidEndpoint(e.to_string()))?;
    url.query_pairs_mut().append_pair("endpoint", rpc);
    Ok(url.to_string())
}
