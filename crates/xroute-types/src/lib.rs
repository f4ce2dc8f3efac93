use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain identifier as used by the routing API (e.g. "osmosis-1").
pub type ChainId = String;

/// Asset denomination on its chain (e.g. "uosmo", "ibc/...").
pub type Denom = String;

/// Chain id → user address for every hop of a route.
///
/// Ordered so that two equal bindings always serialise identically.
pub type AddressBinding = BTreeMap<ChainId, String>;

/// Chain id → assets available on that chain.
pub type AssetMap = BTreeMap<ChainId, Vec<Asset>>;

/// xroute error types.
#[derive(Debug, Error)]
pub enum XrouteError {
    #[error("invalid bech32 address: {0}")]
    InvalidAddress(String),

    #[error("invalid bech32 prefix: {0}")]
    InvalidPrefix(String),

    #[error("no address available for chains: {}", .0.join(", "))]
    UnresolvedChains(Vec<ChainId>),

    #[error("route request is incomplete: missing {}", .0.join(", "))]
    IncompleteRoute(Vec<String>),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("routing api returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, XrouteError>;

/// A chain known to the routing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: ChainId,
    pub chain_name: String,
    #[serde(default)]
    pub bech32_prefix: Option<String>,
    #[serde(default)]
    pub chain_type: Option<String>,
    #[serde(default)]
    pub logo_uri: Option<String>,
}

/// A fungible asset on a given chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub denom: Denom,
    pub chain_id: ChainId,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub recommended_symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Asset {
    /// Label shown to users: recommended symbol, then symbol, then denom.
    pub fn display_symbol(&self) -> &str {
        self.recommended_symbol
            .as_deref()
            .or(self.symbol.as_deref())
            .unwrap_or(&self.denom)
    }

    /// Key used to order assets within a chain.
    pub fn sort_key(&self) -> &str {
        self.recommended_symbol.as_deref().unwrap_or(&self.denom)
    }
}

/// User selection on the source side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSelection {
    pub chain_id: Option<ChainId>,
    pub asset_denom: Option<Denom>,
}

/// User selection on the destination side, including the receiving address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSelection {
    pub chain_id: Option<ChainId>,
    pub asset_denom: Option<Denom>,
    pub destination_address: Option<String>,
}

/// Request body for the route endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub source_asset_chain_id: ChainId,
    pub source_asset_denom: Denom,
    pub dest_asset_chain_id: ChainId,
    pub dest_asset_denom: Denom,
    pub amount_in: String, // base units
    pub smart_relay: bool,
    pub allow_multi_tx: bool,
    pub allow_unsafe: bool,
}

/// A route returned by the routing API.
///
/// Only `chain_ids` is interpreted locally; `operations` is carried back to
/// the API untouched when requesting messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub source_asset_chain_id: ChainId,
    pub source_asset_denom: Denom,
    pub dest_asset_chain_id: ChainId,
    pub dest_asset_denom: Denom,
    pub amount_in: String,
    pub amount_out: String,
    pub chain_ids: Vec<ChainId>,
    #[serde(default)]
    pub required_chain_addresses: Vec<ChainId>,
    #[serde(default)]
    pub operations: Vec<serde_json::Value>,
    #[serde(default)]
    pub txs_required: u32,
    #[serde(default)]
    pub does_swap: bool,
    #[serde(default)]
    pub estimated_amount_out: Option<String>,
}

impl Route {
    /// Chains that need a user address before messages can be generated.
    pub fn address_chains(&self) -> &[ChainId] {
        if self.required_chain_addresses.is_empty() {
            &self.chain_ids
        } else {
            &self.required_chain_addresses
        }
    }
}

/// An unsigned message to be signed on `chain_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxMessage {
    pub chain_id: ChainId,
    pub body: serde_json::Value,
}

/// A broadcast transaction being tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    pub tx_hash: String,
    pub chain_id: ChainId,
}

/// Lifecycle state reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxState {
    #[serde(rename = "STATE_SUBMITTED")]
    Submitted,
    #[serde(rename = "STATE_PENDING")]
    Pending,
    #[serde(rename = "STATE_COMPLETED_SUCCESS")]
    CompletedSuccess,
    #[serde(rename = "STATE_COMPLETED_ERROR")]
    CompletedError,
    #[serde(rename = "STATE_ABANDONED")]
    Abandoned,
    #[serde(rename = "STATE_PENDING_ERROR")]
    PendingError,
    #[serde(other)]
    Unknown,
}

impl TxState {
    pub fn is_final(self) -> bool {
        matches!(
            self,
            TxState::CompletedSuccess | TxState::CompletedError | TxState::Abandoned
        )
    }
}

/// Status of a tracked transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxStatus {
    pub state: TxState,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub transfer_sequence: Vec<serde_json::Value>,
}
