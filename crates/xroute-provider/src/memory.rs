//! In-memory providers and wallet (for testing and ephemeral use).

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use xroute_address::ChainAddressLookup;
use xroute_types::{
    AddressBinding, Asset, AssetMap, Chain, Result, Route, RouteQuery, TxInfo, TxMessage, TxState,
    TxStatus, XrouteError,
};

use crate::{address_list, CatalogProvider, RouteProvider, Wallet, WalletConfig};

/// In-memory catalog and router.
///
/// Routes are matched on source/destination chain and denom; statuses are
/// replayed per tx hash in the order they were pushed, the last one
/// repeating.
pub struct MemoryProvider {
    chains: Mutex<Vec<Chain>>,
    assets: Mutex<AssetMap>,
    routes: Mutex<Vec<Route>>,
    statuses: Mutex<HashMap<String, VecDeque<TxStatus>>>,
    tracked: Mutex<Vec<TxInfo>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            chains: Mutex::new(Vec::new()),
            assets: Mutex::new(AssetMap::new()),
            routes: Mutex::new(Vec::new()),
            statuses: Mutex::new(HashMap::new()),
            tracked: Mutex::new(Vec::new()),
        }
    }

    /// Provider preloaded with the sample catalog and route.
    pub fn with_samples() -> Self {
        let provider = Self::new();
        provider.set_chains(sample_chains());
        provider.set_assets(sample_assets());
        provider.add_route(sample_route());
        provider
    }

    pub fn set_chains(&self, chains: Vec<Chain>) {
        *self.chains.lock().unwrap() = chains;
    }

    pub fn set_assets(&self, assets: AssetMap) {
        *self.assets.lock().unwrap() = assets;
    }

    pub fn add_route(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }

    /// Queue a status to be returned for `tx_hash`.
    pub fn push_status(&self, tx_hash: &str, status: TxStatus) {
        self.statuses
            .lock()
            .unwrap()
            .entry(tx_hash.to_string())
            .or_default()
            .push_back(status);
    }

    /// Transactions registered through `track_transaction`.
    pub fn tracked(&self) -> Vec<TxInfo> {
        self.tracked.lock().unwrap().clone()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogProvider for MemoryProvider {
    async fn chains(&self) -> Result<Vec<Chain>> {
        Ok(self.chains.lock().unwrap().clone())
    }

    async fn assets(&self) -> Result<AssetMap> {
        Ok(self.assets.lock().unwrap().clone())
    }
}

#[async_trait]
impl RouteProvider for MemoryProvider {
    async fn route(&self, query: &RouteQuery) -> Result<Route> {
        let routes = self.routes.lock().unwrap();
        let found = routes.iter().find(|r| {
            r.source_asset_chain_id == query.source_asset_chain_id
                && r.source_asset_denom == query.source_asset_denom
                && r.dest_asset_chain_id == query.dest_asset_chain_id
                && r.dest_asset_denom == query.dest_asset_denom
        });

        match found {
            Some(route) => {
                let mut route = route.clone();
                route.amount_in = query.amount_in.clone();
                Ok(route)
            }
            None => Err(XrouteError::Api {
                status: 404,
                message: "no route found".into(),
            }),
        }
    }

    async fn messages(&self, route: &Route, addresses: &AddressBinding) -> Result<Vec<TxMessage>> {
        let address_list = address_list(route, addresses)?;
        let chain_id = route
            .chain_ids
            .first()
            .cloned()
            .ok_or_else(|| XrouteError::Other("route has no hops".into()))?;

        Ok(vec![TxMessage {
            chain_id,
            body: serde_json::json!({
                "msg_type_url": "/ibc.applications.transfer.v1.MsgTransfer",
                "address_list": address_list,
                "amount_in": route.amount_in,
            }),
        }])
    }

    async fn track_transaction(&self, tx: &TxInfo) -> Result<()> {
        self.tracked.lock().unwrap().push(tx.clone());
        Ok(())
    }

    async fn transaction_status(&self, tx: &TxInfo) -> Result<TxStatus> {
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses.get_mut(&tx.tx_hash).ok_or_else(|| XrouteError::Api {
            status: 404,
            message: format!("unknown transaction {}", tx.tx_hash),
        })?;

        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        status.ok_or_else(|| XrouteError::Other(format!("no status for {}", tx.tx_hash)))
    }
}

/// In-memory wallet: fixed accounts, records every broadcast.
pub struct MemoryWallet {
    accounts: HashMap<String, String>,
    prefixes: HashMap<String, String>,
    broadcasts: Mutex<Vec<(String, usize, WalletConfig)>>,
}

impl MemoryWallet {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            prefixes: HashMap::new(),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(mut self, chain_id: &str, address: &str) -> Self {
        self.accounts.insert(chain_id.to_string(), address.to_string());
        self
    }

    pub fn with_prefix(mut self, chain_id: &str, prefix: &str) -> Self {
        self.prefixes.insert(chain_id.to_string(), prefix.to_string());
        self
    }

    /// Tx hash the wallet returns for its `n`th broadcast (0-based).
    pub fn tx_hash(n: usize) -> String {
        format!("{:064X}", n + 1)
    }

    /// (chain id, message count, config) for every broadcast so far.
    pub fn broadcasts(&self) -> Vec<(String, usize, WalletConfig)> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl Default for MemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainAddressLookup for MemoryWallet {
    fn bech32_prefix(&self, chain_id: &str) -> Option<String> {
        self.prefixes.get(chain_id).cloned()
    }

    fn account_address(&self, chain_id: &str) -> Option<String> {
        self.accounts.get(chain_id).cloned()
    }
}

#[async_trait]
impl Wallet for MemoryWallet {
    async fn sign_and_broadcast(
        &self,
        chain_id: &str,
        msgs: &[TxMessage],
        config: &WalletConfig,
    ) -> Result<String> {
        if !self.accounts.contains_key(chain_id) {
            return Err(XrouteError::Wallet(format!("not connected to {}", chain_id)));
        }
        let mut broadcasts = self.broadcasts.lock().unwrap();
        let hash = Self::tx_hash(broadcasts.len());
        broadcasts.push((chain_id.to_string(), msgs.len(), *config));
        Ok(hash)
    }
}

/// A successful final status.
pub fn completed_status() -> TxStatus {
    TxStatus {
        state: TxState::CompletedSuccess,
        error: None,
        transfer_sequence: Vec::new(),
    }
}

/// Sample chains: Cosmos Hub, Noble, Osmosis.
pub fn sample_chains() -> Vec<Chain> {
    [
        ("osmosis-1", "osmosis", "osmo"),
        ("cosmoshub-4", "cosmoshub", "cosmos"),
        ("noble-1", "noble", "noble"),
    ]
    .into_iter()
    .map(|(id, name, prefix)| Chain {
        chain_id: id.into(),
        chain_name: name.into(),
        bech32_prefix: Some(prefix.into()),
        chain_type: Some("cosmos".into()),
        logo_uri: None,
    })
    .collect()
}

/// Sample assets for the sample chains.
pub fn sample_assets() -> AssetMap {
    let asset = |chain_id: &str, denom: &str, symbol: &str, decimals: u32| Asset {
        denom: denom.into(),
        chain_id: chain_id.into(),
        decimals: Some(decimals),
        symbol: Some(symbol.into()),
        recommended_symbol: Some(symbol.to_uppercase()),
        name: None,
    };

    let mut assets = AssetMap::new();
    assets.insert(
        "cosmoshub-4".into(),
        vec![asset("cosmoshub-4", "uatom", "atom", 6)],
    );
    assets.insert(
        "noble-1".into(),
        vec![asset("noble-1", "uusdc", "usdc", 6)],
    );
    assets.insert(
        "osmosis-1".into(),
        vec![
            asset("osmosis-1", "uosmo", "osmo", 6),
            asset("osmosis-1", "ibc/498A0751", "usdc", 6),
        ],
    );
    assets
}

/// Sample three-hop route: Cosmos Hub → Noble → Osmosis.
pub fn sample_route() -> Route {
    Route {
        source_asset_chain_id: "cosmoshub-4".into(),
        source_asset_denom: "uatom".into(),
        dest_asset_chain_id: "osmosis-1".into(),
        dest_asset_denom: "uosmo".into(),
        amount_in: "1000000".into(),
        amount_out: "5400000".into(),
        chain_ids: vec!["cosmoshub-4".into(), "noble-1".into(), "osmosis-1".into()],
        required_chain_addresses: vec![
            "cosmoshub-4".into(),
            "noble-1".into(),
            "osmosis-1".into(),
        ],
        operations: Vec::new(),
        txs_required: 1,
        does_swap: true,
        estimated_amount_out: Some("5400000".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_route_matches_selection_and_amount() {
        let provider = MemoryProvider::with_samples();
        let query = RouteQuery {
            source_asset_chain_id: "cosmoshub-4".into(),
            source_asset_denom: "uatom".into(),
            dest_asset_chain_id: "osmosis-1".into(),
            dest_asset_denom: "uosmo".into(),
            amount_in: "2500000".into(),
            smart_relay: true,
            allow_multi_tx: true,
            allow_unsafe: true,
        };
        let route = provider.route(&query).await.unwrap();
        assert_eq!(route.amount_in, "2500000");
        assert_eq!(route.chain_ids.len(), 3);

        let mut other = query.clone();
        other.dest_asset_denom = "uion".into();
        assert!(matches!(
            provider.route(&other).await,
            Err(XrouteError::Api { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_statuses_replay_in_order() {
        let provider = MemoryProvider::new();
        let tx = TxInfo { tx_hash: "AB".into(), chain_id: "cosmoshub-4".into() };
        provider.push_status(
            "AB",
            TxStatus { state: TxState::Pending, error: None, transfer_sequence: vec![] },
        );
        provider.push_status("AB", completed_status());

        assert_eq!(provider.transaction_status(&tx).await.unwrap().state, TxState::Pending);
        assert_eq!(provider.transaction_status(&tx).await.unwrap().state, TxState::CompletedSuccess);
        assert_eq!(provider.transaction_status(&tx).await.unwrap().state, TxState::CompletedSuccess);

        let unknown = TxInfo { tx_hash: "CD".into(), chain_id: "cosmoshub-4".into() };
        assert!(provider.transaction_status(&unknown).await.is_err());
    }

    #[tokio::test]
    async fn test_wallet_requires_connected_chain() {
        let wallet = MemoryWallet::new().with_account("cosmoshub-4", "cosmos1src");
        let config = WalletConfig::default();

        let hash = wallet.sign_and_broadcast("cosmoshub-4", &[], &config).await.unwrap();
        assert_eq!(hash, MemoryWallet::tx_hash(0));
        assert!(wallet.sign_and_broadcast("osmosis-1", &[], &config).await.is_err());
        assert_eq!(wallet.broadcasts().len(), 1);
    }
}
