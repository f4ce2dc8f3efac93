//! Bech32 address codec.
//!
//! Cosmos-style addresses share one payload across chains; only the
//! human-readable prefix differs. Re-encoding keeps the payload and swaps
//! the prefix:
//!   cosmos1qypq...lzv7xu → osmo1qypq...helwsw

use bech32::{primitives::decode::CheckedHrpstring, Bech32, Hrp};
use xroute_types::{Result, XrouteError};

/// Longest payload a bech32 address may carry (cosmos limit).
const MAX_PAYLOAD_LEN: usize = 255;

/// A decoded bech32 address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub prefix: String,
    pub payload: Vec<u8>,
}

impl DecodedAddress {
    /// Payload as lowercase hex, without a `0x` prefix.
    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

fn validate_length(bytes: &[u8]) -> Result<()> {
    match bytes.len() {
        1..=MAX_PAYLOAD_LEN => Ok(()),
        n => Err(XrouteError::InvalidAddress(format!(
            "payload length {} out of range",
            n
        ))),
    }
}

/// Decode a bech32 address into its prefix and payload bytes.
pub fn decode(address: &str) -> Result<DecodedAddress> {
    let checked = CheckedHrpstring::new::<Bech32>(address.trim())
        .map_err(|e| XrouteError::InvalidAddress(format!("{}: {}", address, e)))?;

    let payload: Vec<u8> = checked.byte_iter().collect();
    validate_length(&payload)?;

    Ok(DecodedAddress {
        prefix: checked.hrp().to_lowercase(),
        payload,
    })
}

/// Encode raw payload bytes under `prefix`.
pub fn encode(prefix: &str, payload: &[u8]) -> Result<String> {
    validate_length(payload)?;
    let hrp = Hrp::parse(prefix)
        .map_err(|e| XrouteError::InvalidPrefix(format!("{}: {}", prefix, e)))?;
    bech32::encode::<Bech32>(hrp, payload)
        .map_err(|e| XrouteError::InvalidAddress(format!("encoding failed: {}", e)))
}

/// Re-encode `address` so it carries `prefix`, keeping the same payload.
pub fn reencode(address: &str, prefix: &str) -> Result<String> {
    if prefix.trim().is_empty() {
        return Err(XrouteError::InvalidPrefix("empty prefix".into()));
    }
    let decoded = decode(address)?;
    encode(prefix, &decoded.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reencode_vectors_from_json() {
        let data = include_str!("../../../tests/vectors/address.json");
        let vectors: serde_json::Value = serde_json::from_str(data).unwrap();

        for v in vectors["reencode"].as_array().unwrap() {
            let address = v["address"].as_str().unwrap();
            let prefix = v["prefix"].as_str().unwrap();
            let expected = v["expected"].as_str().unwrap();

            let got = reencode(address, prefix).unwrap();
            assert_eq!(
                got, expected,
                "reencode mismatch for '{}': got {} expected {}",
                v["name"].as_str().unwrap(), got, expected
            );

            let original = decode(address).unwrap();
            let rebound = decode(&got).unwrap();
            assert_eq!(rebound.prefix, prefix);
            assert_eq!(original.payload, rebound.payload, "payload changed");
            assert_eq!(rebound.payload_hex(), v["payload"].as_str().unwrap());
        }
    }

    #[test]
    fn test_rejects_bad_checksum() {
        // last character flipped
        let err = decode("cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xq").unwrap_err();
        assert!(matches!(err, XrouteError::InvalidAddress(_)));
    }

    #[test]
    fn test_rejects_empty_or_invalid_prefix() {
        let addr = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";
        assert!(matches!(reencode(addr, ""), Err(XrouteError::InvalidPrefix(_))));
        assert!(matches!(reencode(addr, "  "), Err(XrouteError::InvalidPrefix(_))));
        assert!(matches!(reencode(addr, "bad prefix"), Err(XrouteError::InvalidPrefix(_))));
    }

    #[test]
    fn test_rejects_non_bech32_input() {
        assert!(decode("0x0102030405060708090a0b0c0d0e0f1011121314").is_err());
        assert!(decode("").is_err());
        assert!(encode("osmo", &[]).is_err());
    }
}
