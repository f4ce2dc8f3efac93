//! Per-hop address reconciliation for cross-chain routes.
//!
//! - `encoding`: bech32 decode / prefix re-encoding
//! - `resolver`: route hops → user address binding

pub mod encoding;
pub mod resolver;

pub use encoding::{decode, reencode};
pub use resolver::{chain_hops, missing_chains, resolve, ChainAddressLookup, ChainHop};
