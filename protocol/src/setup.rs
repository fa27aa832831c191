//! # Public Parameters
//!
//! One `PublicParams` per token-management-service instance: created once
//! by [`setup`], then read-only and shared by reference (`Arc`) with every
//! prover, verifier, and auditor.
//!
//! ## Generator derivation
//!
//! Nothing here is sampled. Every generator is a hash-to-curve image of a
//! fixed label (see [`crate::crypto::curve::hash_to_g1`]):
//!
//! ```text
//! G_type  = H2C("Pedersen.Type")
//! G_value = H2C("Pedersen.Value")
//! G_blind = H2C("Pedersen.BlindingFactor")
//! P       = H2C("RangeProof.P")
//! Q       = H2C("RangeProof.Q")
//! L_i     = H2C("RangeProof.Left.<i>")     for i in 0..bitLength
//! R_i     = H2C("RangeProof.Right.<i>")
//! ```
//!
//! Anyone can re-derive and compare them, which is the whole point: no
//! party can know a discrete-log relation between any two of them.

use std::fmt;
use std::str::FromStr;

use ark_bn254::G1Affine;
use ark_ec::AffineRepr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{
    ConfigError, SetupConfig, DLOG_PUBLIC_PARAMETERS, MAX_PRECISION, PEDERSEN_BASIS_LEN,
    PUBLIC_PARAMS_VERSION, SUPPORTED_PRECISIONS,
};
use crate::crypto::{hash_to_g1, sha256, CryptoError};
use crate::encoding::{self, ark_bytes, EncodingError};
use crate::identity::Identity;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid curve [{0}]")]
    InvalidCurve(String),

    #[error("invalid bit length [{0}], must be a power of two in [1, 64]")]
    InvalidBitLength(u64),

    #[error("invalid public parameters: {0}")]
    InvalidPublicParameters(String),

    #[error("invalid identifier, expecting [{expected}], got [{got}]")]
    LabelMismatch { expected: String, got: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

fn invalid(reason: impl Into<String>) -> SetupError {
    SetupError::InvalidPublicParameters(reason.into())
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Curve identifiers, indexed the way deployed parameters number them.
/// Only [`CurveId::Bn254`] has arithmetic behind it in this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveId {
    Fp256BnAmcl,
    Bn254,
    Fp256MiraclBn,
    Bls12_381,
    Bls12_381Gurvy,
    Bls12_381Bbs,
    Bls12_381BbsGurvy,
}

impl CurveId {
    pub fn is_supported(self) -> bool {
        matches!(self, CurveId::Bn254)
    }

    pub fn name(self) -> &'static str {
        match self {
            CurveId::Fp256BnAmcl => "FP256BN_AMCL",
            CurveId::Bn254 => "BN254",
            CurveId::Fp256MiraclBn => "FP256BN_AMCL_MIRACL",
            CurveId::Bls12_381 => "BLS12_381",
            CurveId::Bls12_381Gurvy => "BLS12_381_GURVY",
            CurveId::Bls12_381Bbs => "BLS12_381_BBS",
            CurveId::Bls12_381BbsGurvy => "BLS12_381_BBS_GURVY",
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveId {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            CurveId::Fp256BnAmcl,
            CurveId::Bn254,
            CurveId::Fp256MiraclBn,
            CurveId::Bls12_381,
            CurveId::Bls12_381Gurvy,
            CurveId::Bls12_381Bbs,
            CurveId::Bls12_381BbsGurvy,
        ];
        all.into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SetupError::InvalidCurve(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Public key of an anonymous-credential issuer that certifies owners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerPublicKey {
    pub public_key: Vec<u8>,
    pub curve: CurveId,
}

/// Generators for the range proof and its inner-product argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProofParams {
    pub bit_length: u64,
    pub number_of_rounds: u64,
    #[serde(with = "ark_bytes")]
    pub left_generators: Vec<G1Affine>,
    #[serde(with = "ark_bytes")]
    pub right_generators: Vec<G1Affine>,
    #[serde(with = "ark_bytes")]
    pub p: G1Affine,
    #[serde(with = "ark_bytes")]
    pub q: G1Affine,
}

impl RangeProofParams {
    /// Derive all range-proof generators for `bit_length` (a power of two).
    pub fn generate(bit_length: u64) -> Result<Self, SetupError> {
        check_bit_length(bit_length)?;
        let n = bit_length as usize;
        let mut left_generators = Vec::with_capacity(n);
        let mut right_generators = Vec::with_capacity(n);
        for i in 0..n {
            left_generators.push(hash_to_g1(format!("RangeProof.Left.{i}").as_bytes())?);
            right_generators.push(hash_to_g1(format!("RangeProof.Right.{i}").as_bytes())?);
        }
        Ok(Self {
            bit_length,
            number_of_rounds: u64::from(bit_length.trailing_zeros()),
            left_generators,
            right_generators,
            p: hash_to_g1(b"RangeProof.P")?,
            q: hash_to_g1(b"RangeProof.Q")?,
        })
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.bit_length == 0 {
            return Err(invalid("invalid range proof parameters: bit length is zero"));
        }
        if self.number_of_rounds >= 64 || self.bit_length != 1u64 << self.number_of_rounds {
            return Err(invalid(format!(
                "invalid range proof parameters: bit length [{}] does not match [{}] rounds",
                self.bit_length, self.number_of_rounds
            )));
        }
        if self.left_generators.len() != self.right_generators.len() {
            return Err(invalid(format!(
                "invalid range proof parameters: the size of the left generators does not match the size of the right generators [{} vs {}]",
                self.left_generators.len(),
                self.right_generators.len()
            )));
        }
        if self.left_generators.len() as u64 != self.bit_length {
            return Err(invalid(format!(
                "invalid range proof parameters: expected [{}] generators, got [{}]",
                self.bit_length,
                self.left_generators.len()
            )));
        }
        let all = self
            .left_generators
            .iter()
            .chain(&self.right_generators)
            .chain([&self.p, &self.q]);
        if all.into_iter().any(|g| g.is_zero()) {
            return Err(invalid(
                "invalid range proof parameters: generator is the identity",
            ));
        }
        Ok(())
    }
}

/// Everything a prover, verifier, or auditor needs to agree on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParams {
    pub label: String,
    pub curve: CurveId,
    /// `(G_type, G_value, G_blind)`.
    #[serde(with = "ark_bytes")]
    pub pedersen_generators: Vec<G1Affine>,
    pub range_proof_params: RangeProofParams,
    pub issuer_public_keys: Vec<IssuerPublicKey>,
    pub auditor: Option<Identity>,
    /// Identities allowed to issue. Empty means anyone may.
    pub issuer_ids: Vec<Identity>,
    pub max_token: u64,
    pub quantity_precision: u64,
}

#[derive(Serialize, Deserialize)]
struct ParamsContainer {
    identifier: String,
    raw: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn check_bit_length(bit_length: u64) -> Result<(), SetupError> {
    if bit_length == 0 || bit_length > MAX_PRECISION || !bit_length.is_power_of_two() {
        return Err(SetupError::InvalidBitLength(bit_length));
    }
    Ok(())
}

/// `2^bit_length - 1`, saturating at `u64::MAX` for 64-bit precision.
fn max_value(bit_length: u64) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}

/// Derive the three Pedersen generators.
pub fn pedersen_generators() -> Result<Vec<G1Affine>, CryptoError> {
    ["Pedersen.Type", "Pedersen.Value", "Pedersen.BlindingFactor"]
        .iter()
        .map(|label| hash_to_g1(label.as_bytes()))
        .collect()
}

/// Build fresh public parameters.
///
/// # Errors
///
/// - [`SetupError::InvalidCurve`] if `curve` has no arithmetic here.
/// - [`SetupError::InvalidBitLength`] if `bit_length` is zero, above 64, or
///   not a power of two (the inner-product argument halves the vectors
///   every round).
pub fn setup(
    bit_length: u64,
    issuer_public_key: &[u8],
    curve: CurveId,
) -> Result<PublicParams, SetupError> {
    if !curve.is_supported() {
        return Err(SetupError::InvalidCurve(curve.to_string()));
    }
    check_bit_length(bit_length)?;

    let pp = PublicParams {
        label: DLOG_PUBLIC_PARAMETERS.to_string(),
        curve,
        pedersen_generators: pedersen_generators()?,
        range_proof_params: RangeProofParams::generate(bit_length)?,
        issuer_public_keys: vec![IssuerPublicKey {
            public_key: issuer_public_key.to_vec(),
            curve,
        }],
        auditor: None,
        issuer_ids: Vec::new(),
        max_token: max_value(bit_length),
        quantity_precision: bit_length,
    };
    debug!(bit_length, curve = %curve, "public parameters generated");
    Ok(pp)
}

impl PublicParams {
    /// Run [`setup`] from an operator config, then register the configured
    /// issuers and auditor.
    pub fn from_config(config: &SetupConfig) -> Result<Self, SetupError> {
        let curve: CurveId = config.curve.parse()?;
        let mut pp = setup(config.bit_length, &config.issuer_public_key_bytes()?, curve)?;
        for id in config.issuer_ids()? {
            pp.add_issuer(Identity::new(id));
        }
        if let Some(auditor) = config.auditor_id()? {
            pp.add_auditor(Identity::new(auditor));
        }
        Ok(pp)
    }

    pub fn identifier(&self) -> &str {
        &self.label
    }

    pub fn version(&self) -> &'static str {
        PUBLIC_PARAMS_VERSION
    }

    /// Token type and value are hidden on the ledger.
    pub fn token_data_hiding(&self) -> bool {
        true
    }

    /// The spend graph is public.
    pub fn graph_hiding(&self) -> bool {
        false
    }

    pub fn precision(&self) -> u64 {
        self.quantity_precision
    }

    pub fn max_token_value(&self) -> u64 {
        self.max_token
    }

    pub fn compute_max_token_value(&self) -> u64 {
        max_value(self.range_proof_params.bit_length)
    }

    pub fn auditors(&self) -> Vec<Identity> {
        self.auditor.iter().cloned().collect()
    }

    pub fn issuers(&self) -> &[Identity] {
        &self.issuer_ids
    }

    pub fn add_auditor(&mut self, auditor: Identity) {
        self.auditor = Some(auditor);
    }

    pub fn add_issuer(&mut self, issuer: Identity) {
        self.issuer_ids.push(issuer);
    }

    pub fn serialize(&self) -> Result<Vec<u8>, SetupError> {
        let raw = encoding::encode(self)?;
        Ok(encoding::encode(&ParamsContainer {
            identifier: self.label.clone(),
            raw,
        })?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, SetupError> {
        let container: ParamsContainer = encoding::decode(raw)?;
        if container.identifier != DLOG_PUBLIC_PARAMETERS {
            return Err(SetupError::LabelMismatch {
                expected: DLOG_PUBLIC_PARAMETERS.to_string(),
                got: container.identifier,
            });
        }
        let pp: PublicParams = encoding::decode(&container.raw)?;
        if pp.label != container.identifier {
            return Err(SetupError::LabelMismatch {
                expected: container.identifier,
                got: pp.label,
            });
        }
        Ok(pp)
    }

    /// SHA-256 of the serialized parameters.
    pub fn compute_hash(&self) -> Result<[u8; 32], SetupError> {
        Ok(sha256(&self.serialize()?))
    }

    /// Check internal consistency. Run this on anything that came off the
    /// wire before handing it to a prover or verifier.
    pub fn validate(&self) -> Result<(), SetupError> {
        if !self.curve.is_supported() {
            return Err(invalid(format!("unsupported curve [{}]", self.curve)));
        }
        if self.issuer_public_keys.len() != 1 {
            return Err(invalid(format!(
                "expected one issuer public key, found [{}]",
                self.issuer_public_keys.len()
            )));
        }
        let ipk = &self.issuer_public_keys[0];
        if ipk.public_key.is_empty() {
            return Err(invalid("expected issuer public key to be non-empty"));
        }
        if !ipk.curve.is_supported() {
            return Err(invalid(format!("unsupported issuer curve [{}]", ipk.curve)));
        }
        if self.pedersen_generators.len() != PEDERSEN_BASIS_LEN {
            return Err(invalid(format!(
                "length of Pedersen basis != {PEDERSEN_BASIS_LEN}: [{}]",
                self.pedersen_generators.len()
            )));
        }
        if self.pedersen_generators.iter().any(|g| g.is_zero()) {
            return Err(invalid("Pedersen generator is the identity"));
        }
        self.range_proof_params.validate()?;

        let bit_length = self.range_proof_params.bit_length;
        if !SUPPORTED_PRECISIONS.contains(&bit_length) {
            return Err(invalid(format!(
                "invalid bit length [{bit_length}], should be one of {SUPPORTED_PRECISIONS:?}"
            )));
        }
        if self.quantity_precision != bit_length {
            return Err(invalid(format!(
                "quantity precision should be [{bit_length}] instead it is [{}]",
                self.quantity_precision
            )));
        }
        let max_token = self.compute_max_token_value();
        if max_token != self.max_token {
            return Err(invalid(format!(
                "invalid max token, [{max_token}] != [{}]",
                self.max_token
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
