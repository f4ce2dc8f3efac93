//! Route session orchestration: catalog, selections, route, execution.
//!
//! `RouteSession` keeps the user's current selections and drives the
//! amount → query → route → addresses → execution flow against the
//! provider and wallet collaborators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use xroute_address::ChainAddressLookup;
use xroute_client::ClientConfig;
use xroute_planner::{catalog, RouteOptions, RouteRequest};
use xroute_provider::{CatalogProvider, RouteProvider, Wallet, WalletConfig};
use xroute_types::{
    AddressBinding, Asset, AssetMap, AssetSelection, Chain, ChainId, DestinationSelection, Result,
    Route, TxInfo, TxMessage, TxState, TxStatus, XrouteError,
};

/// Execution progress events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
    /// A broadcast transaction was registered for tracking.
    TransactionTracked { tx: TxInfo },
    /// A tracked transaction completed successfully. Failed or abandoned
    /// transactions end execution with an error instead.
    TransactionCompleted { tx: TxInfo, status: TxStatus },
}

pub type ExecutionEventHandler = Box<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub route_options: RouteOptions,
    pub wallet: WalletConfig,
    pub status_poll_ms: u64,
    pub max_status_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            route_options: RouteOptions::default(),
            wallet: WalletConfig::default(),
            status_poll_ms: 1_000,
            max_status_attempts: 120,
        }
    }
}

impl From<&ClientConfig> for SessionConfig {
    fn from(client: &ClientConfig) -> Self {
        Self {
            status_poll_ms: client.status_poll_ms,
            max_status_attempts: client.max_status_attempts,
            ..Self::default()
        }
    }
}

/// Catalog prefixes first, then whatever the wallet knows.
struct SessionLookup<'a> {
    chains: &'a [Chain],
    wallet: &'a dyn Wallet,
}

impl ChainAddressLookup for SessionLookup<'_> {
    fn bech32_prefix(&self, chain_id: &str) -> Option<String> {
        catalog::find_chain(self.chains, chain_id)
            .and_then(|c| c.bech32_prefix.clone())
            .filter(|p| !p.is_empty())
            .or_else(|| self.wallet.bech32_prefix(chain_id))
    }

    fn account_address(&self, chain_id: &str) -> Option<String> {
        self.wallet.account_address(chain_id)
    }
}

/// Split messages into per-chain batches, keeping their order.
///
/// Consecutive messages on the same chain are signed together.
pub fn group_by_chain(msgs: Vec<TxMessage>) -> Vec<(ChainId, Vec<TxMessage>)> {
    let mut groups: Vec<(ChainId, Vec<TxMessage>)> = Vec::new();
    for msg in msgs {
        match groups.last_mut() {
            Some((chain_id, batch)) if *chain_id == msg.chain_id => batch.push(msg),
            _ => groups.push((msg.chain_id.clone(), vec![msg])),
        }
    }
    groups
}

/// One user's transfer session.
pub struct RouteSession {
    catalog: Arc<dyn CatalogProvider>,
    router: Arc<dyn RouteProvider>,
    wallet: Arc<dyn Wallet>,
    config: SessionConfig,

    chains: Vec<Chain>,
    assets: AssetMap,
    source: AssetSelection,
    destination: DestinationSelection,
    amount: Option<String>,
    route: Option<Route>,
    tx_info: Vec<TxInfo>,
}

impl RouteSession {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        router: Arc<dyn RouteProvider>,
        wallet: Arc<dyn Wallet>,
    ) -> Self {
        Self::with_config(catalog, router, wallet, SessionConfig::default())
    }

    pub fn with_config(
        catalog: Arc<dyn CatalogProvider>,
        router: Arc<dyn RouteProvider>,
        wallet: Arc<dyn Wallet>,
        config: SessionConfig,
    ) -> Self {
        Self {
            catalog,
            router,
            wallet,
            config,
            chains: Vec::new(),
            assets: AssetMap::new(),
            source: AssetSelection::default(),
            destination: DestinationSelection::default(),
            amount: None,
            route: None,
            tx_info: Vec::new(),
        }
    }

    /// Fetch chains and assets, sorted for display.
    pub async fn load_catalog(&mut self) -> Result<()> {
        let mut chains = self.catalog.chains().await?;
        let mut assets = self.catalog.assets().await?;
        catalog::sort_chains(&mut chains);
        catalog::sort_assets(&mut assets);

        info!(chains = chains.len(), asset_chains = assets.len(), "catalog loaded");
        self.chains = chains;
        self.assets = assets;
        Ok(())
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Assets available on `chain_id`, sorted by display symbol.
    pub fn assets_on(&self, chain_id: &str) -> &[Asset] {
        self.assets.get(chain_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn source(&self) -> &AssetSelection {
        &self.source
    }

    pub fn destination(&self) -> &DestinationSelection {
        &self.destination
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn tx_info(&self) -> &[TxInfo] {
        &self.tx_info
    }

    /// Select the source chain. Clears the source asset.
    pub fn set_source_chain(&mut self, chain_id: Option<ChainId>) {
        self.source.chain_id = chain_id;
        self.source.asset_denom = None;
        self.route = None;
    }

    pub fn set_source_asset(&mut self, denom: Option<String>) {
        self.source.asset_denom = denom;
        self.route = None;
    }

    /// Select the destination chain. Clears the destination asset.
    pub fn set_destination_chain(&mut self, chain_id: Option<ChainId>) {
        self.destination.chain_id = chain_id;
        self.destination.asset_denom = None;
        self.route = None;
    }

    pub fn set_destination_asset(&mut self, denom: Option<String>) {
        self.destination.asset_denom = denom;
        self.route = None;
    }

    /// The receiving address does not change the route.
    pub fn set_destination_address(&mut self, address: Option<String>) {
        self.destination.destination_address = address;
    }

    /// Raw amount as typed by the user.
    pub fn set_amount(&mut self, amount: Option<String>) {
        self.amount = amount;
        self.route = None;
    }

    /// Selected source asset, if it is in the catalog.
    pub fn source_asset(&self) -> Option<&Asset> {
        let chain_id = self.source.chain_id.as_deref()?;
        let denom = self.source.asset_denom.as_deref()?;
        catalog::find_asset(&self.assets, chain_id, denom)
    }

    fn source_decimals(&self) -> Option<u32> {
        self.source_asset().and_then(|a| a.decimals)
    }

    /// Entered amount in base units of the source asset.
    pub fn amount_in(&self) -> Option<String> {
        xroute_amount::parse_base_units(self.amount.as_deref(), self.source_decimals())
    }

    pub fn route_request(&self) -> RouteRequest {
        RouteRequest::from_input(
            &self.source,
            &self.destination,
            self.amount.as_deref(),
            self.source_decimals(),
            self.config.route_options,
        )
    }

    /// Request a route for the current selections.
    ///
    /// Returns `None` without calling the router while the request is
    /// incomplete. A failed request leaves no route behind.
    pub async fn refresh_route(&mut self) -> Result<Option<&Route>> {
        self.route = None;
        let query = match self.route_request() {
            RouteRequest::Ready(query) => query,
            RouteRequest::Incomplete(_) => return Ok(None),
        };

        let route = self.router.route(&query).await?;
        info!(
            hops = route.chain_ids.len(),
            amount_in = %route.amount_in,
            amount_out = %route.amount_out,
            "route found"
        );
        self.route = Some(route);
        Ok(self.route.as_ref())
    }

    /// Address bound to each hop of the current route.
    pub fn user_addresses(&self) -> AddressBinding {
        let Some(route) = self.route.as_ref() else {
            return AddressBinding::new();
        };
        let connected = self
            .source
            .chain_id
            .as_deref()
            .and_then(|chain_id| self.wallet.account_address(chain_id));
        let lookup = SessionLookup {
            chains: &self.chains,
            wallet: self.wallet.as_ref(),
        };

        xroute_address::resolve(
            &route.chain_ids,
            connected.as_deref(),
            self.destination.destination_address.as_deref(),
            &lookup,
        )
    }

    /// Chains of the current route that still need an address.
    pub fn missing_addresses(&self) -> Vec<ChainId> {
        match self.route.as_ref() {
            Some(route) => xroute_address::missing_chains(route.address_chains(), &self.user_addresses()),
            None => Vec::new(),
        }
    }

    pub fn can_execute(&self) -> bool {
        xroute_planner::can_execute(
            &self.source,
            &self.destination,
            self.route.as_ref(),
            &self.missing_addresses(),
        )
    }

    /// Sign, broadcast and track every transaction of the current route.
    ///
    /// Batches are executed in order; each one must complete successfully
    /// before the next is signed.
    pub async fn execute_route(
        &mut self,
        on_event: Option<ExecutionEventHandler>,
    ) -> Result<Vec<TxStatus>> {
        let route = self
            .route
            .clone()
            .ok_or_else(|| XrouteError::Other("no route to execute".into()))?;
        let missing = self.missing_addresses();
        if !missing.is_empty() {
            return Err(XrouteError::UnresolvedChains(missing));
        }

        let result = self.run(&route, on_event.as_ref()).await;
        if let Err(ref e) = result {
            error!(error = %e, "route execution failed");
        }
        result
    }

    async fn run(
        &mut self,
        route: &Route,
        on_event: Option<&ExecutionEventHandler>,
    ) -> Result<Vec<TxStatus>> {
        let emit = |event: ExecutionEvent| {
            if let Some(handler) = on_event {
                handler(event);
            }
        };

        let addresses = self.user_addresses();
        let msgs = self.router.messages(route, &addresses).await?;
        let mut statuses = Vec::new();

        for (chain_id, batch) in group_by_chain(msgs) {
            let tx_hash = self
                .wallet
                .sign_and_broadcast(&chain_id, &batch, &self.config.wallet)
                .await?;
            let tx = TxInfo { tx_hash, chain_id };
            info!(tx_hash = %tx.tx_hash, chain_id = %tx.chain_id, msgs = batch.len(), "transaction broadcast");

            self.router.track_transaction(&tx).await?;
            self.tx_info.push(tx.clone());
            emit(ExecutionEvent::TransactionTracked { tx: tx.clone() });

            let status = xroute_client::wait_for_final_status(
                self.router.as_ref(),
                &tx,
                self.config.max_status_attempts,
                self.config.status_poll_ms,
            )
            .await?;
            if status.state != TxState::CompletedSuccess {
                return Err(XrouteError::Other(format!(
                    "transaction {} on {} ended in state {:?}",
                    tx.tx_hash, tx.chain_id, status.state
                )));
            }
            emit(ExecutionEvent::TransactionCompleted {
                tx: tx.clone(),
                status: status.clone(),
            });
            statuses.push(status);
        }

        Ok(statuses)
    }

    /// Status of the first transaction of the last execution.
    pub async fn transaction_status(&self) -> Result<Option<TxStatus>> {
        match self.tx_info.first() {
            Some(tx) => self.router.transaction_status(tx).await.map(Some),
            None => Ok(None),
        }
    }
}
