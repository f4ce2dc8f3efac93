//! Route hop → user address binding.
//!
//! Rules, applied per hop in route order:
//! - first hop: the connected wallet address
//! - intermediate hop: the wallet's account on that chain, or the connected
//!   address, re-encoded under the hop chain's bech32 prefix
//! - last hop: the destination address (overrides the first-hop rule on
//!   single-hop routes)
//!
//! A chain with no binding is unresolved and blocks execution.

use std::collections::{BTreeMap, HashMap};

use xroute_types::{AddressBinding, ChainId};

use crate::encoding;

/// Per-chain address data supplied by the wallet and chain catalog.
pub trait ChainAddressLookup {
    /// Bech32 prefix for addresses on `chain_id`.
    fn bech32_prefix(&self, chain_id: &str) -> Option<String>;

    /// Account the wallet already holds on `chain_id`.
    fn account_address(&self, _chain_id: &str) -> Option<String> {
        None
    }
}

impl ChainAddressLookup for HashMap<ChainId, String> {
    fn bech32_prefix(&self, chain_id: &str) -> Option<String> {
        self.get(chain_id).cloned()
    }
}

impl ChainAddressLookup for BTreeMap<ChainId, String> {
    fn bech32_prefix(&self, chain_id: &str) -> Option<String> {
        self.get(chain_id).cloned()
    }
}

/// A position in a route's hop list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHop<'a> {
    pub chain_id: &'a str,
    pub index: usize,
    pub is_first: bool,
    pub is_last: bool,
}

impl ChainHop<'_> {
    pub fn is_intermediate(&self) -> bool {
        !self.is_first && !self.is_last
    }
}

/// Enumerate the hops of a route.
pub fn chain_hops(chain_ids: &[ChainId]) -> impl Iterator<Item = ChainHop<'_>> {
    let last = chain_ids.len().saturating_sub(1);
    chain_ids.iter().enumerate().map(move |(index, chain_id)| ChainHop {
        chain_id: chain_id.as_str(),
        index,
        is_first: index == 0,
        is_last: index == last,
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn intermediate_address<L: ChainAddressLookup + ?Sized>(
    chain_id: &str,
    connected: Option<&str>,
    lookup: &L,
) -> Option<String> {
    let prefix = lookup.bech32_prefix(chain_id)?;
    let prefix = present(Some(prefix.as_str()))?;

    let account = lookup.account_address(chain_id);
    let source = present(account.as_deref()).or(present(connected))?;

    encoding::reencode(source, prefix).ok()
}

/// Bind every resolvable hop of `hops` to a user address.
///
/// Empty strings count as absent. The result depends only on the inputs.
pub fn resolve<L: ChainAddressLookup + ?Sized>(
    hops: &[ChainId],
    connected: Option<&str>,
    destination: Option<&str>,
    lookup: &L,
) -> AddressBinding {
    let mut binding = AddressBinding::new();

    for hop in chain_hops(hops) {
        if hop.is_first {
            if let Some(addr) = present(connected) {
                binding.insert(hop.chain_id.to_string(), addr.to_string());
            }
        }

        if hop.is_intermediate() {
            if let Some(addr) = intermediate_address(hop.chain_id, connected, lookup) {
                binding.insert(hop.chain_id.to_string(), addr);
            }
        }

        if hop.is_last {
            if let Some(addr) = present(destination) {
                binding.insert(hop.chain_id.to_string(), addr.to_string());
            }
        }
    }

    binding
}

/// Chains of `hops` that have no bound address, in route order.
pub fn missing_chains(hops: &[ChainId], binding: &AddressBinding) -> Vec<ChainId> {
    let mut missing: Vec<ChainId> = Vec::new();
    for chain_id in hops {
        if !binding.contains_key(chain_id) && !missing.contains(chain_id) {
            missing.push(chain_id.clone());
        }
    }
    missing
}
