//! Chain/asset catalog helpers used to populate selections.

use std::cmp::Ordering;

use xroute_types::{Asset, AssetMap, Chain};

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort chains by display name.
pub fn sort_chains(chains: &mut [Chain]) {
    chains.sort_by(|a, b| compare_labels(&a.chain_name, &b.chain_name));
}

/// Sort every chain's assets by recommended symbol, falling back to denom.
pub fn sort_assets(assets: &mut AssetMap) {
    for list in assets.values_mut() {
        list.sort_by(|a, b| compare_labels(a.sort_key(), b.sort_key()));
    }
}

/// Look up an asset by chain and denom.
pub fn find_asset<'a>(assets: &'a AssetMap, chain_id: &str, denom: &str) -> Option<&'a Asset> {
    assets.get(chain_id)?.iter().find(|asset| asset.denom == denom)
}

/// Look up a chain by id.
pub fn find_chain<'a>(chains: &'a [Chain], chain_id: &str) -> Option<&'a Chain> {
    chains.iter().find(|chain| chain.chain_id == chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: &str, name: &str) -> Chain {
        Chain {
            chain_id: id.into(),
            chain_name: name.into(),
            bech32_prefix: None,
            chain_type: Some("cosmos".into()),
            logo_uri: None,
        }
    }

    fn asset(chain_id: &str, denom: &str, symbol: Option<&str>) -> Asset {
        Asset {
            denom: denom.into(),
            chain_id: chain_id.into(),
            decimals: Some(6),
            symbol: None,
            recommended_symbol: symbol.map(Into::into),
            name: None,
        }
    }

    #[test]
    fn test_sort_chains_by_name_case_insensitive() {
        let mut chains = vec![
            chain("osmosis-1", "osmosis"),
            chain("cosmoshub-4", "Cosmos Hub"),
            chain("noble-1", "noble"),
            chain("akashnet-2", "akash"),
        ];
        sort_chains(&mut chains);
        let names: Vec<&str> = chains.iter().map(|c| c.chain_name.as_str()).collect();
        assert_eq!(names, ["akash", "Cosmos Hub", "noble", "osmosis"]);
    }

    #[test]
    fn test_sort_assets_falls_back_to_denom() {
        let mut assets = AssetMap::new();
        assets.insert(
            "osmosis-1".into(),
            vec![
                asset("osmosis-1", "uosmo", Some("OSMO")),
                asset("osmosis-1", "ibc/27394FB0", Some("ATOM")),
                asset("osmosis-1", "factory/osmo1xyz/bar", None),
            ],
        );
        sort_assets(&mut assets);
        let denoms: Vec<&str> = assets["osmosis-1"].iter().map(|a| a.denom.as_str()).collect();
        assert_eq!(denoms, ["ibc/27394FB0", "factory/osmo1xyz/bar", "uosmo"]);
    }

    #[test]
    fn test_find_asset_and_chain() {
        let mut assets = AssetMap::new();
        assets.insert("osmosis-1".into(), vec![asset("osmosis-1", "uosmo", Some("OSMO"))]);
        assert_eq!(find_asset(&assets, "osmosis-1", "uosmo").unwrap().decimals, Some(6));
        assert!(find_asset(&assets, "osmosis-1", "uion").is_none());
        assert!(find_asset(&assets, "noble-1", "uusdc").is_none());

        let chains = vec![chain("noble-1", "noble")];
        assert!(find_chain(&chains, "noble-1").is_some());
        assert!(find_chain(&chains, "osmosis-1").is_none());
    }
}
