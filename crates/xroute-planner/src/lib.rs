//! Route request assembly and execution gating.
//!
//! - Route query: source + destination selections + base-unit amount
//! - Catalog ordering: chains by name, assets by symbol
//! - Execute gating: every selection present, a route, no unresolved hop

pub mod catalog;

use std::fmt;

use serde::{Deserialize, Serialize};
use xroute_types::{
    AssetSelection, ChainId, DestinationSelection, Result, Route, RouteQuery, XrouteError,
};

/// Flags sent alongside every route query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOptions {
    pub smart_relay: bool,
    pub allow_multi_tx: bool,
    pub allow_unsafe: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            smart_relay: true,
            allow_multi_tx: true,
            allow_unsafe: true,
        }
    }
}

/// A field a route query cannot be built without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingField {
    SourceChain,
    SourceAsset,
    DestinationChain,
    DestinationAsset,
    Amount,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::SourceChain => "source chain",
            MissingField::SourceAsset => "source asset",
            MissingField::DestinationChain => "destination chain",
            MissingField::DestinationAsset => "destination asset",
            MissingField::Amount => "amount",
        };
        f.write_str(name)
    }
}

/// Outcome of assembling a route query.
///
/// `Incomplete` is the normal state while the user is still selecting; it
/// must not be sent to the routing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRequest {
    Ready(RouteQuery),
    Incomplete(Vec<MissingField>),
}

impl RouteRequest {
    /// Build from a raw user amount, converting it with the asset's
    /// decimals. Empty or malformed amounts leave the request incomplete;
    /// a typed zero does not.
    pub fn from_input(
        source: &AssetSelection,
        destination: &DestinationSelection,
        raw_amount: Option<&str>,
        decimals: Option<u32>,
        options: RouteOptions,
    ) -> Self {
        let amount_in = xroute_amount::parse_base_units(raw_amount, decimals);
        build_route_query(source, destination, amount_in.as_deref(), options)
    }

    pub fn query(&self) -> Option<&RouteQuery> {
        match self {
            RouteRequest::Ready(query) => Some(query),
            RouteRequest::Incomplete(_) => None,
        }
    }

    pub fn into_query(self) -> Option<RouteQuery> {
        match self {
            RouteRequest::Ready(query) => Some(query),
            RouteRequest::Incomplete(_) => None,
        }
    }

    /// The query, or `IncompleteRoute` naming every missing field.
    pub fn into_result(self) -> Result<RouteQuery> {
        match self {
            RouteRequest::Ready(query) => Ok(query),
            RouteRequest::Incomplete(missing) => Err(XrouteError::IncompleteRoute(
                missing.iter().map(ToString::to_string).collect(),
            )),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, RouteRequest::Ready(_))
    }

    /// Missing fields, empty when ready.
    pub fn missing(&self) -> &[MissingField] {
        match self {
            RouteRequest::Ready(_) => &[],
            RouteRequest::Incomplete(missing) => missing,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_base_units(amount: &str) -> bool {
    !amount.is_empty() && amount.bytes().all(|b| b.is_ascii_digit())
}

/// Assemble a route query from the current selections.
///
/// `amount_in` must already be in base units. Identifiers are not checked
/// against the catalog; the routing API rejects unknown ones.
pub fn build_route_query(
    source: &AssetSelection,
    destination: &DestinationSelection,
    amount_in: Option<&str>,
    options: RouteOptions,
) -> RouteRequest {
    let source_chain = present(&source.chain_id);
    let source_denom = present(&source.asset_denom);
    let dest_chain = present(&destination.chain_id);
    let dest_denom = present(&destination.asset_denom);
    let amount = amount_in.map(str::trim).filter(|a| is_base_units(a));

    match (source_chain, source_denom, dest_chain, dest_denom, amount) {
        (Some(sc), Some(sd), Some(dc), Some(dd), Some(amount)) => RouteRequest::Ready(RouteQuery {
            source_asset_chain_id: sc.to_string(),
            source_asset_denom: sd.to_string(),
            dest_asset_chain_id: dc.to_string(),
            dest_asset_denom: dd.to_string(),
            amount_in: amount.to_string(),
            smart_relay: options.smart_relay,
            allow_multi_tx: options.allow_multi_tx,
            allow_unsafe: options.allow_unsafe,
        }),
        _ => {
            let checks = [
                (source_chain.is_none(), MissingField::SourceChain),
                (source_denom.is_none(), MissingField::SourceAsset),
                (dest_chain.is_none(), MissingField::DestinationChain),
                (dest_denom.is_none(), MissingField::DestinationAsset),
                (amount.is_none(), MissingField::Amount),
            ];
            RouteRequest::Incomplete(
                checks
                    .into_iter()
                    .filter(|(missing, _)| *missing)
                    .map(|(_, field)| field)
                    .collect(),
            )
        }
    }
}

/// Whether the execute action may be offered.
///
/// Requires both selections (including a destination address), a route,
/// and a bound address for every hop.
pub fn can_execute(
    source: &AssetSelection,
    destination: &DestinationSelection,
    route: Option<&Route>,
    missing_addresses: &[ChainId],
) -> bool {
    present(&source.chain_id).is_some()
        && present(&source.asset_denom).is_some()
        && present(&destination.chain_id).is_some()
        && present(&destination.asset_denom).is_some()
        && present(&destination.destination_address).is_some()
        && route.is_some()
        && missing_addresses.is_empty()
}
