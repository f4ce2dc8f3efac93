//! Collaborator traits for the routing service and the wallet.
//!
//! Defines `CatalogProvider`, `RouteProvider` and `Wallet`. Provides
//! in-memory implementations for testing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use xroute_address::ChainAddressLookup;
use xroute_types::{
    AddressBinding, AssetMap, Chain, Route, RouteQuery, Result, TxInfo, TxMessage, TxStatus,
    XrouteError,
};

pub mod memory;

/// Signing preferences handed to the wallet with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Keep the fee chosen by the caller instead of letting the wallet edit it.
    pub prefer_no_set_fee: bool,
    /// Keep the memo chosen by the caller.
    pub prefer_no_set_memo: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            prefer_no_set_fee: true,
            prefer_no_set_memo: true,
        }
    }
}

/// Source of the chain and asset catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn chains(&self) -> Result<Vec<Chain>>;
    async fn assets(&self) -> Result<AssetMap>;
}

/// Route computation, message generation and transaction tracking.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, query: &RouteQuery) -> Result<Route>;

    /// Unsigned messages for `route`, with one address per required chain.
    async fn messages(&self, route: &Route, addresses: &AddressBinding) -> Result<Vec<TxMessage>>;

    /// Register a broadcast transaction for status tracking.
    async fn track_transaction(&self, tx: &TxInfo) -> Result<()>;

    async fn transaction_status(&self, tx: &TxInfo) -> Result<TxStatus>;
}

/// A connected wallet: per-chain accounts plus signing.
#[async_trait]
pub trait Wallet: ChainAddressLookup + Send + Sync {
    /// Sign `msgs` on `chain_id` and broadcast them. Returns the tx hash.
    async fn sign_and_broadcast(
        &self,
        chain_id: &str,
        msgs: &[TxMessage],
        config: &WalletConfig,
    ) -> Result<String>;
}

/// Addresses for every chain that needs one, in route order.
///
/// Fails with `UnresolvedChains` listing every chain without a binding.
pub fn address_list(route: &Route, addresses: &AddressBinding) -> Result<Vec<String>> {
    let mut list = Vec::with_capacity(route.address_chains().len());
    let mut missing = Vec::new();

    for chain_id in route.address_chains() {
        match addresses.get(chain_id) {
            Some(addr) => list.push(addr.clone()),
            None if !missing.contains(chain_id) => missing.push(chain_id.clone()),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(XrouteError::UnresolvedChains(missing));
    }
    Ok(list)
}
