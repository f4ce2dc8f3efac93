//! HTTP client for the Skip routing API.
//!
//! Endpoints:
//! - GET  /v2/info/chains
//! - GET  /v2/fungible/assets
//! - POST /v2/fungible/route
//! - POST /v2/fungible/msgs
//! - POST /v2/tx/track
//! - GET  /v2/tx/status?tx_hash=<hash>&chain_id=<id>

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xroute_provider::{address_list, CatalogProvider, RouteProvider};
use xroute_types::{
    AddressBinding, Asset, AssetMap, Chain, ChainId, Result, Route, RouteQuery, TxInfo, TxMessage,
    TxStatus, XrouteError,
};

use crate::ClientConfig;

#[derive(Debug, Clone, Deserialize)]
struct ChainsResponse {
    chains: Vec<Chain>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChainAssets {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
struct AssetsResponse {
    chain_to_assets_map: BTreeMap<ChainId, ChainAssets>,
}

/// Request body for the msgs endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MsgsRequest<'a> {
    pub source_asset_denom: &'a str,
    pub source_asset_chain_id: &'a str,
    pub dest_asset_denom: &'a str,
    pub dest_asset_chain_id: &'a str,
    pub amount_in: &'a str,
    pub amount_out: &'a str,
    pub address_list: Vec<String>,
    pub operations: &'a [serde_json::Value],
    pub slippage_tolerance_percent: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct MsgsResponse {
    #[serde(default)]
    msgs: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
struct TrackRequest<'a> {
    tx_hash: &'a str,
    chain_id: &'a str,
}

/// Unwrap one entry of the msgs response.
///
/// Entries are keyed by kind (`multi_chain_msg`, `evm_tx`, ...); the inner
/// object carries the chain id.
pub fn parse_message(entry: &serde_json::Value) -> Result<TxMessage> {
    let inner = entry
        .as_object()
        .and_then(|obj| obj.values().find(|v| v.get("chain_id").is_some()))
        .ok_or_else(|| XrouteError::Decode(format!("message without chain id: {}", entry)))?;

    let chain_id = inner["chain_id"]
        .as_str()
        .ok_or_else(|| XrouteError::Decode("chain_id is not a string".into()))?;

    Ok(TxMessage {
        chain_id: chain_id.to_string(),
        body: inner.clone(),
    })
}

/// Routing API client.
pub struct SkipClient {
    base_url: String,
    api_key: Option<String>,
    slippage_tolerance_percent: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SkipClient {
    pub fn new(config: &ClientConfig) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            slippage_tolerance_percent: config.slippage_tolerance_percent.clone(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.header("authorization", key),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let resp = self
            .with_auth(builder)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| XrouteError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XrouteError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        resp.json()
            .await
            .map_err(|e| XrouteError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "routing api GET");
        self.send(self.client.get(&url).query(query)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "routing api POST");
        self.send(self.client.post(&url).json(body)).await
    }
}

/// Prefer the API's `message` field; fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl CatalogProvider for SkipClient {
    async fn chains(&self) -> Result<Vec<Chain>> {
        let body: ChainsResponse = self.get_json("/v2/info/chains", &[]).await?;
        Ok(body.chains)
    }

    async fn assets(&self) -> Result<AssetMap> {
        let body: AssetsResponse = self.get_json("/v2/fungible/assets", &[]).await?;
        Ok(body
            .chain_to_assets_map
            .into_iter()
            .map(|(chain_id, entry)| (chain_id, entry.assets))
            .collect())
    }
}

#[async_trait]
impl RouteProvider for SkipClient {
    async fn route(&self, query: &RouteQuery) -> Result<Route> {
        self.post_json("/v2/fungible/route", query).await
    }

    async fn messages(&self, route: &Route, addresses: &AddressBinding) -> Result<Vec<TxMessage>> {
        let request = MsgsRequest {
            source_asset_denom: &route.source_asset_denom,
            source_asset_chain_id: &route.source_asset_chain_id,
            dest_asset_denom: &route.dest_asset_denom,
            dest_asset_chain_id: &route.dest_asset_chain_id,
            amount_in: &route.amount_in,
            amount_out: &route.amount_out,
            address_list: address_list(route, addresses)?,
            operations: &route.operations,
            slippage_tolerance_percent: &self.slippage_tolerance_percent,
        };

        let body: MsgsResponse = self.post_json("/v2/fungible/msgs", &request).await?;
        body.msgs.iter().map(parse_message).collect()
    }

    async fn track_transaction(&self, tx: &TxInfo) -> Result<()> {
        let request = TrackRequest {
            tx_hash: &tx.tx_hash,
            chain_id: &tx.chain_id,
        };
        let _: serde_json::Value = self.post_json("/v2/tx/track", &request).await?;
        Ok(())
    }

    async fn transaction_status(&self, tx: &TxInfo) -> Result<TxStatus> {
        self.get_json(
            "/v2/tx/status",
            &[("tx_hash", tx.tx_hash.as_str()), ("chain_id", tx.chain_id.as_str())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_multi_chain_message() {
        let entry = json!({
            "multi_chain_msg": {
                "chain_id": "cosmoshub-4",
                "path": ["cosmoshub-4", "osmosis-1"],
                "msg": "{\"source_port\":\"transfer\"}",
                "msg_type_url": "/ibc.applications.transfer.v1.MsgTransfer"
            }
        });
        let msg = parse_message(&entry).unwrap();
        assert_eq!(msg.chain_id, "cosmoshub-4");
        assert_eq!(msg.body["msg_type_url"], "/ibc.applications.transfer.v1.MsgTransfer");
    }

    #[test]
    fn test_parse_message_without_chain_fails() {
        assert!(matches!(
            parse_message(&json!({"unknown": {"foo": 1}})),
            Err(XrouteError::Decode(_))
        ));
        assert!(parse_message(&json!("raw")).is_err());
    }

    #[test]
    fn test_assets_response_shape() {
        let body: AssetsResponse = serde_json::from_value(json!({
            "chain_to_assets_map": {
                "osmosis-1": {
                    "assets": [{
                        "denom": "uosmo",
                        "chain_id": "osmosis-1",
                        "origin_denom": "uosmo",
                        "decimals": 6,
                        "recommended_symbol": "OSMO"
                    }]
                },
                "empty-1": {}
            }
        }))
        .unwrap();
        assert_eq!(body.chain_to_assets_map["osmosis-1"].assets[0].decimals, Some(6));
        assert!(body.chain_to_assets_map["empty-1"].assets.is_empty());
    }

    #[test]
    fn test_msgs_request_wire_names() {
        let route = xroute_provider::memory::sample_route();
        let request = MsgsRequest {
            source_asset_denom: &route.source_asset_denom,
            source_asset_chain_id: &route.source_asset_chain_id,
            dest_asset_denom: &route.dest_asset_denom,
            dest_asset_chain_id: &route.dest_asset_chain_id,
            amount_in: &route.amount_in,
            amount_out: &route.amount_out,
            address_list: vec!["cosmos1a".into(), "noble1b".into(), "osmo1c".into()],
            operations: &route.operations,
            slippage_tolerance_percent: "1",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["address_list"][2], "osmo1c");
        assert_eq!(value["slippage_tolerance_percent"], "1");
        assert_eq!(value["amount_out"], "5400000");
    }

    #[test]
    fn test_api_error_message_prefers_message_field() {
        assert_eq!(
            api_error_message(r#"{"code":3,"message":"no routes found","details":[]}"#),
            "no routes found"
        );
        assert_eq!(api_error_message("bad gateway"), "bad gateway");
    }

    mod over_http {
        use super::*;
        use axum::{
            extract::Query,
            http::{HeaderMap, StatusCode},
            routing::{get, post},
            Json, Router,
        };
        use std::collections::HashMap;
        use xroute_provider::memory::sample_route;
        use xroute_types::TxState;

        type Reply = (StatusCode, Json<serde_json::Value>);

        fn ok(body: serde_json::Value) -> Reply {
            (StatusCode::OK, Json(body))
        }

        fn fail(status: StatusCode, message: &str) -> Reply {
            (status, Json(json!({"code": 5, "message": message})))
        }

        /// Local stand-in for the routing API.
        async fn spawn_api() -> String {
            let app = Router::new()
                .route(
                    "/v2/info/chains",
                    get(|headers: HeaderMap| async move {
                        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                            Some("secret") => ok(json!({"chains": [
                                {"chain_id": "osmosis-1", "chain_name": "osmosis", "bech32_prefix": "osmo"}
                            ]})),
                            _ => fail(StatusCode::UNAUTHORIZED, "missing api key"),
                        }
                    }),
                )
                .route("/v2/fungible/assets", get(|| async { "definitely not json" }))
                .route(
                    "/v2/fungible/route",
                    post(|Json(body): Json<serde_json::Value>| async move {
                        if body["source_asset_denom"] != "uatom" {
                            return fail(StatusCode::BAD_REQUEST, "no routes found");
                        }
                        let mut route = sample_route();
                        route.amount_in = body["amount_in"].as_str().unwrap_or_default().to_string();
                        ok(serde_json::to_value(route).unwrap())
                    }),
                )
                .route(
                    "/v2/fungible/msgs",
                    post(|Json(body): Json<serde_json::Value>| async move {
                        ok(json!({"msgs": [{"multi_chain_msg": {
                            "chain_id": body["source_asset_chain_id"],
                            "address_list": body["address_list"],
                            "slippage_tolerance_percent": body["slippage_tolerance_percent"],
                        }}]}))
                    }),
                )
                .route(
                    "/v2/tx/track",
                    post(|Json(body): Json<serde_json::Value>| async move {
                        ok(json!({"tx_hash": body["tx_hash"]}))
                    }),
                )
                .route(
                    "/v2/tx/status",
                    get(|Query(q): Query<HashMap<String, String>>| async move {
                        let known = q.get("tx_hash").map(String::as_str) == Some("AA")
                            && q.get("chain_id").map(String::as_str) == Some("cosmoshub-4");
                        if known {
                            ok(json!({"state": "STATE_COMPLETED_SUCCESS", "transfer_sequence": []}))
                        } else {
                            fail(StatusCode::NOT_FOUND, "tx not found")
                        }
                    }),
                );

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            format!("http://{}", addr)
        }

        fn client(base: &str, api_key: Option<&str>) -> SkipClient {
            SkipClient::new(&ClientConfig {
                api_url: base.to_string(),
                api_key: api_key.map(str::to_string),
                ..ClientConfig::default()
            })
        }

        fn query(denom: &str) -> RouteQuery {
            RouteQuery {
                source_asset_chain_id: "cosmoshub-4".into(),
                source_asset_denom: denom.into(),
                dest_asset_chain_id: "osmosis-1".into(),
                dest_asset_denom: "uosmo".into(),
                amount_in: "2500000".into(),
                smart_relay: true,
                allow_multi_tx: true,
                allow_unsafe: true,
            }
        }

        #[tokio::test]
        async fn test_chains_sends_api_key() {
            let base = spawn_api().await;

            let chains = client(&base, Some("secret")).chains().await.unwrap();
            assert_eq!(chains.len(), 1);
            assert_eq!(chains[0].bech32_prefix.as_deref(), Some("osmo"));

            match client(&base, None).chains().await {
                Err(XrouteError::Api { status, message }) => {
                    assert_eq!(status, 401);
                    assert_eq!(message, "missing api key");
                }
                other => panic!("expected api error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_bad_body_is_decode_error() {
            let base = spawn_api().await;
            let err = client(&base, None).assets().await.unwrap_err();
            assert!(matches!(err, XrouteError::Decode(_)), "got {:?}", err);
        }

        #[tokio::test]
        async fn test_route_and_api_error_message() {
            let base = spawn_api().await;
            let client = client(&base, None);

            let route = client.route(&query("uatom")).await.unwrap();
            assert_eq!(route.amount_in, "2500000");
            assert_eq!(route.chain_ids, ["cosmoshub-4", "noble-1", "osmosis-1"]);

            match client.route(&query("uion")).await {
                Err(XrouteError::Api { status, message }) => {
                    assert_eq!(status, 400);
                    assert_eq!(message, "no routes found");
                }
                other => panic!("expected api error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_messages_send_address_list_in_route_order() {
            let base = spawn_api().await;
            let route = sample_route();
            let mut binding = AddressBinding::new();
            binding.insert("osmosis-1".into(), "osmo1dest".into());
            binding.insert("noble-1".into(), "noble1mid".into());
            binding.insert("cosmoshub-4".into(), "cosmos1src".into());

            let msgs = client(&base, None).messages(&route, &binding).await.unwrap();
            assert_eq!(msgs.len(), 1);
            assert_eq!(msgs[0].chain_id, "cosmoshub-4");
            assert_eq!(msgs[0].body["address_list"], json!(["cosmos1src", "noble1mid", "osmo1dest"]));
            assert_eq!(msgs[0].body["slippage_tolerance_percent"], "1");
        }

        #[tokio::test]
        async fn test_track_and_status_query() {
            let base = spawn_api().await;
            let client = client(&base, None);
            let tx = TxInfo { tx_hash: "AA".into(), chain_id: "cosmoshub-4".into() };

            client.track_transaction(&tx).await.unwrap();
            let status = client.transaction_status(&tx).await.unwrap();
            assert_eq!(status.state, TxState::CompletedSuccess);

            let other = TxInfo { tx_hash: "AA".into(), chain_id: "noble-1".into() };
            assert!(matches!(
                client.transaction_status(&other).await,
                Err(XrouteError::Api { status: 404, .. })
            ));
        }

        #[tokio::test]
        async fn test_unreachable_api_is_http_error() {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            drop(listener);

            let err = client(&base, None).chains().await.unwrap_err();
            assert!(matches!(err, XrouteError::Http(_)), "got {:?}", err);
        }
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = ClientConfig {
            api_url: "https://api.example.com/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(SkipClient::new(&config).base_url(), "https://api.example.com");
    }
}
