//! # Protocol Configuration & Constants
//!
//! Every protocol-level constant lives here, next to the small config
//! struct operators use to drive [`crate::setup::setup`] from a file.
//!
//! Changing any of the domain tags below changes every generator and every
//! Fiat-Shamir challenge, which invalidates all previously issued proofs.
//! Treat them as frozen.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Wire version carried by every serialized issue and transfer action.
pub const PROTOCOL_V1: u32 = 1;

/// Identifier embedded in serialized public parameters.
pub const DLOG_PUBLIC_PARAMETERS: &str = "zkatdlognoghv1";

/// Version string reported by [`crate::setup::PublicParams::version`].
pub const PUBLIC_PARAMS_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Quantities
// ---------------------------------------------------------------------------

/// Bit lengths accepted by `PublicParams::validate`.
pub const SUPPORTED_PRECISIONS: [u64; 3] = [16, 32, 64];

/// Bit length used when a config does not name one.
pub const DEFAULT_PRECISION: u64 = 64;

/// Values are `u64`, so nothing wider makes sense.
pub const MAX_PRECISION: u64 = 64;

// ---------------------------------------------------------------------------
// Curve & Commitments
// ---------------------------------------------------------------------------

/// The only curve this implementation ships arithmetic for.
pub const DEFAULT_CURVE: &str = "BN254";

/// Pedersen basis size: type, value, blinding factor.
pub const PEDERSEN_BASIS_LEN: usize = 3;

/// blake3 `derive_key` context for nothing-up-my-sleeve generators.
pub const GENERATOR_DOMAIN: &str = "zkatdlog v1 2026-01 generator derivation";

/// Upper bound on try-and-increment attempts per generator. Each attempt
/// succeeds with probability ~1/2.
pub const HASH_TO_CURVE_MAX_ATTEMPTS: u32 = 256;

// ---------------------------------------------------------------------------
// Fiat-Shamir domains
// ---------------------------------------------------------------------------

pub const SAME_TYPE_DOMAIN: &str = "zkatdlog v1 2026-01 same-type proof";
pub const TYPE_AND_SUM_DOMAIN: &str = "zkatdlog v1 2026-01 type-and-sum proof";
pub const RANGE_PROOF_DOMAIN: &str = "zkatdlog v1 2026-01 range proof";
pub const IPA_DOMAIN: &str = "zkatdlog v1 2026-01 inner-product argument";

// ---------------------------------------------------------------------------
// Wire limits
// ---------------------------------------------------------------------------

/// Hard cap on any bincode message we are willing to decode (16 MiB).
pub const MAX_MESSAGE_SIZE: u64 = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Setup config
// ---------------------------------------------------------------------------

/// Errors raised while loading a [`SetupConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid hex in field `{field}`: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
}

/// Operator-facing description of a public-parameter setup.
///
/// Identities and the issuer key are hex strings so the file stays
/// hand-editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub bit_length: u64,
    pub curve: String,
    pub issuer_public_key: String,
    pub issuers: Vec<String>,
    pub auditor: Option<String>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            bit_length: DEFAULT_PRECISION,
            curve: DEFAULT_CURVE.to_string(),
            issuer_public_key: String::new(),
            issuers: Vec::new(),
            auditor: None,
        }
    }
}

impl SetupConfig {
    /// Parse a config from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn issuer_public_key_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        decode_hex("issuer_public_key", &self.issuer_public_key)
    }

    pub fn issuer_ids(&self) -> Result<Vec<Vec<u8>>, ConfigError> {
        self.issuers
            .iter()
            .map(|id| decode_hex("issuers", id))
            .collect()
    }

    pub fn auditor_id(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        self.auditor
            .as_deref()
            .map(|id| decode_hex("auditor", id))
            .transpose()
    }
}

fn decode_hex(field: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|source| ConfigError::InvalidHex { field, source })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_precision_is_supported() {
        assert!(SUPPORTED_PRECISIONS.contains(&DEFAULT_PRECISION));
        assert!(SUPPORTED_PRECISIONS.iter().all(|p| *p <= MAX_PRECISION));
        assert!(SUPPORTED_PRECISIONS.iter().all(|p| p.is_power_of_two()));
    }

    #[test]
    fn test_domains_are_distinct() {
        let domains = [
            GENERATOR_DOMAIN,
            SAME_TYPE_DOMAIN,
            TYPE_AND_SUM_DOMAIN,
            RANGE_PROOF_DOMAIN,
            IPA_DOMAIN,
        ];
        for (i, a) in domains.iter().enumerate() {
            for b in &domains[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let cfg = SetupConfig::from_json(r#"{ "bit_length": 32 }"#).unwrap();
        assert_eq!(cfg.bit_length, 32);
        assert_eq!(cfg.curve, DEFAULT_CURVE);
        assert!(cfg.issuers.is_empty());
        assert!(cfg.auditor_id().unwrap().is_none());
    }

    #[test]
    fn test_config_hex_fields() {
        let cfg = SetupConfig::from_json(
            r#"{ "issuer_public_key": "0xdeadbeef", "issuers": ["01", "02"], "auditor": "ff" }"#,
        )
        .unwrap();
        assert_eq!(cfg.issuer_public_key_bytes().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(cfg.issuer_ids().unwrap(), vec![vec![1], vec![2]]);
        assert_eq!(cfg.auditor_id().unwrap(), Some(vec![0xff]));
    }

    #[test]
    fn test_config_rejects_bad_hex() {
        let cfg = SetupConfig::from_json(r#"{ "issuers": ["zz"] }"#).unwrap();
        let err = cfg.issuer_ids().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHex { field: "issuers", .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bit_length": 16, "curve": "BN254" }}"#).unwrap();
        let cfg = SetupConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.bit_length, 16);
    }

    #[test]
    fn test_config_missing_file() {
        let err = SetupConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
