//! # Tokens & Openings
//!
//! A [`Token`] is what the ledger sees: an owner and a Pedersen commitment.
//! A [`Metadata`] is what the owner keeps: the opening of that commitment.
//! [`Token::to_clear`] is the only bridge between the two.
//!
//! ## Wire format
//!
//! Tokens travel as a tagged union so that a commitment token and a
//! plaintext (legacy) token can never be confused:
//!
//! ```text
//! TypedToken = { tag: u8, payload: bytes }
//!   tag 0 => Comm  (Token)
//!   tag 1 => Clear (PlainToken)
//!   other => rejected
//! ```

use std::fmt;

use ark_bn254::{Fr, G1Affine};
use ark_ec::AffineRepr;
use ark_ff::{BigInteger, PrimeField};
use ark_std::rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::PEDERSEN_BASIS_LEN;
use crate::crypto::curve::random_scalar;
use crate::crypto::{commit_token, CryptoError};
use crate::encoding::{self, ark_bytes, to_canonical_bytes, EncodingError};
use crate::identity::Identity;
use crate::setup::PublicParams;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing token type")]
    EmptyType,

    #[error("missing token value")]
    EmptyValue,

    #[error("missing token blinding factor")]
    EmptyBlindingFactor,

    #[error("missing token issuer")]
    MissingIssuer,

    #[error("issuer should not be set")]
    UnexpectedIssuer,

    #[error("token owner cannot be empty")]
    MissingOwner,

    #[error("token data cannot be empty")]
    MissingData,

    #[error("output does not match provided opening")]
    TokenMismatch,

    #[error("cannot get tokens with witness: please initialize curve")]
    CurveNotInitialized,

    #[error("expected [{expected}] elements, got [{got}]")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid quantity [{0}]")]
    InvalidQuantity(String),

    #[error("missing plaintext token in upgrade witness")]
    MissingPlainToken,

    #[error("expected a {expected} token")]
    UnexpectedFormat { expected: &'static str },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

// ---------------------------------------------------------------------------
// Identifiers & quantities
// ---------------------------------------------------------------------------

/// Ledger position of a token: the transaction that created it and the
/// output index inside that transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId {
    pub tx_id: String,
    pub index: u64,
}

impl TokenId {
    pub fn new(tx_id: impl Into<String>, index: u64) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// Render a quantity the way plaintext tokens carry it: `0x` + lowercase hex.
pub fn format_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Parse a `0x`-prefixed hex (or plain decimal) quantity and check it fits
/// in `precision` bits.
pub fn parse_quantity(quantity: &str, precision: u64) -> Result<u64, TokenError> {
    let invalid = || TokenError::InvalidQuantity(quantity.to_string());
    let value = match quantity.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| invalid())?,
        None => quantity.parse::<u64>().map_err(|_| invalid())?,
    };
    if precision < 64 && value >> precision != 0 {
        return Err(invalid());
    }
    Ok(value)
}

/// Read a scalar back as a `u64`, failing if it does not fit.
pub fn fr_to_u64(value: &Fr) -> Result<u64, TokenError> {
    let bigint = value.into_bigint();
    let limbs = bigint.as_ref();
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return Err(TokenError::InvalidQuantity(format!(
            "0x{}",
            hex::encode(bigint.to_bytes_be())
        )));
    }
    Ok(limbs[0])
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A commitment token. An empty owner marks a redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub owner: Identity,
    #[serde(with = "ark_bytes")]
    pub data: G1Affine,
}

/// A token in the clear, recovered from a commitment and its opening.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClearToken {
    pub owner: Identity,
    pub token_type: String,
    pub value: u64,
}

impl ClearToken {
    pub fn quantity(&self) -> String {
        format_quantity(self.value)
    }
}

impl Token {
    pub fn new(owner: Identity, data: G1Affine) -> Self {
        Self { owner, data }
    }

    pub fn is_redeem(&self) -> bool {
        self.owner.is_none()
    }

    /// Structural checks. Outputs may be redemptions, so callers pass
    /// `check_owner = false` for them.
    pub fn validate(&self, check_owner: bool) -> Result<(), TokenError> {
        if check_owner && self.owner.is_none() {
            return Err(TokenError::MissingOwner);
        }
        if self.data.is_zero() {
            return Err(TokenError::MissingData);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TokenError> {
        TypedToken::wrap(TypedToken::COMM, encoding::encode(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, TokenError> {
        match TypedToken::deserialize(raw)? {
            TypedToken::Comm(token) => Ok(token),
            TypedToken::Clear(_) => Err(TokenError::UnexpectedFormat {
                expected: "commitment",
            }),
        }
    }

    /// Open the token with `meta` and return it in the clear.
    ///
    /// The recomputed commitment is compared to `data` over every byte of
    /// the compressed encoding in constant time, so a mismatch costs the
    /// same wherever it occurs.
    ///
    /// # Errors
    ///
    /// [`TokenError::TokenMismatch`] if `meta` does not open `data`.
    pub fn to_clear(&self, meta: &Metadata, pp: &PublicParams) -> Result<ClearToken, TokenError> {
        let value = meta.value.ok_or(TokenError::EmptyValue)?;
        let blinding_factor = meta.blinding_factor.ok_or(TokenError::EmptyBlindingFactor)?;
        let recomputed = commit_token(
            &meta.token_type,
            value,
            blinding_factor,
            &pp.pedersen_generators,
        )?;

        let expected = to_canonical_bytes(&self.data)?;
        let actual = to_canonical_bytes(&recomputed)?;
        if !bool::from(expected.as_slice().ct_eq(actual.as_slice())) {
            return Err(TokenError::TokenMismatch);
        }

        Ok(ClearToken {
            owner: self.owner.clone(),
            token_type: meta.token_type.clone(),
            value: fr_to_u64(&value)?,
        })
    }
}

/// A plaintext token, as issued before commitment tokens existed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainToken {
    pub owner: Identity,
    pub token_type: String,
    pub quantity: String,
}

/// Tagged union of the two token formats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedToken {
    Comm(Token),
    Clear(PlainToken),
}

#[derive(Serialize, Deserialize)]
struct TypedWire {
    tag: u8,
    payload: Vec<u8>,
}

impl From<Token> for TypedToken {
    fn from(token: Token) -> Self {
        TypedToken::Comm(token)
    }
}

impl From<PlainToken> for TypedToken {
    fn from(plain: PlainToken) -> Self {
        TypedToken::Clear(plain)
    }
}

impl TypedToken {
    const COMM: u8 = 0;
    const CLEAR: u8 = 1;

    fn wrap(tag: u8, payload: Vec<u8>) -> Result<Vec<u8>, TokenError> {
        Ok(encoding::encode(&TypedWire { tag, payload })?)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TokenError> {
        match self {
            TypedToken::Comm(token) => token.serialize(),
            TypedToken::Clear(plain) => Self::wrap(Self::CLEAR, encoding::encode(plain)?),
        }
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, TokenError> {
        let wire: TypedWire = encoding::decode(raw)?;
        match wire.tag {
            Self::COMM => Ok(TypedToken::Comm(encoding::decode(&wire.payload)?)),
            Self::CLEAR => Ok(TypedToken::Clear(encoding::decode(&wire.payload)?)),
            other => Err(EncodingError::UnknownTokenType(other).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Opening of a token commitment. `issuer` is set only on issued outputs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub token_type: String,
    #[serde(with = "ark_bytes")]
    pub value: Option<Fr>,
    #[serde(with = "ark_bytes")]
    pub blinding_factor: Option<Fr>,
    pub issuer: Option<Identity>,
}

// Openings are secrets.
impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl Metadata {
    pub fn validate(&self, check_issuer: bool) -> Result<(), TokenError> {
        if self.token_type.is_empty() {
            return Err(TokenError::EmptyType);
        }
        if self.value.is_none() {
            return Err(TokenError::EmptyValue);
        }
        if self.blinding_factor.is_none() {
            return Err(TokenError::EmptyBlindingFactor);
        }
        let has_issuer = self.issuer.as_ref().is_some_and(|i| !i.is_none());
        if check_issuer && !has_issuer {
            return Err(TokenError::MissingIssuer);
        }
        if !check_issuer && has_issuer {
            return Err(TokenError::UnexpectedIssuer);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TokenError> {
        Ok(encoding::encode(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, TokenError> {
        Ok(encoding::decode(raw)?)
    }
}

/// Opening of a freshly created commitment, before it becomes [`Metadata`].
#[derive(Clone, PartialEq, Eq)]
pub struct TokenDataWitness {
    pub token_type: String,
    pub value: u64,
    pub blinding_factor: Fr,
}

impl fmt::Debug for TokenDataWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenDataWitness(..)")
    }
}

impl TokenDataWitness {
    pub fn to_metadata(&self, issuer: Option<Identity>) -> Metadata {
        Metadata {
            token_type: self.token_type.clone(),
            value: Some(Fr::from(self.value)),
            blinding_factor: Some(self.blinding_factor),
            issuer,
        }
    }

    /// Recover a witness from metadata, checking the value fits in a `u64`.
    pub fn from_metadata(meta: &Metadata) -> Result<Self, TokenError> {
        if meta.token_type.is_empty() {
            return Err(TokenError::EmptyType);
        }
        let value = meta.value.ok_or(TokenError::EmptyValue)?;
        Ok(Self {
            token_type: meta.token_type.clone(),
            value: fr_to_u64(&value)?,
            blinding_factor: meta.blinding_factor.ok_or(TokenError::EmptyBlindingFactor)?,
        })
    }
}

/// Opening of a plaintext token being upgraded into a commitment token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeWitness {
    pub plain_token: Option<PlainToken>,
    #[serde(with = "ark_bytes")]
    pub blinding_factor: Option<Fr>,
}

impl UpgradeWitness {
    pub fn validate(&self) -> Result<(), TokenError> {
        let plain = self.plain_token.as_ref().ok_or(TokenError::MissingPlainToken)?;
        if plain.owner.is_none() {
            return Err(TokenError::MissingOwner);
        }
        if plain.token_type.is_empty() {
            return Err(TokenError::EmptyType);
        }
        if plain.quantity.is_empty() {
            return Err(TokenError::EmptyValue);
        }
        if self.blinding_factor.is_none() {
            return Err(TokenError::EmptyBlindingFactor);
        }
        Ok(())
    }

    /// Commit to the plaintext token under `pp`. The result must equal the
    /// data of the commitment token it claims to open.
    pub fn commitment(&self, pp: &PublicParams) -> Result<Token, TokenError> {
        self.validate()?;
        let plain = self.plain_token.as_ref().ok_or(TokenError::MissingPlainToken)?;
        let bf = self.blinding_factor.ok_or(TokenError::EmptyBlindingFactor)?;
        let value = parse_quantity(&plain.quantity, pp.precision())?;
        let commitments =
            get_tokens_with_witness_and_bf(&[value], &plain.token_type, &[bf], &pp.pedersen_generators)?;
        Ok(Token::new(plain.owner.clone(), commitments[0]))
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Commit to each of `values` under a fresh random blinding factor.
///
/// # Errors
///
/// [`TokenError::CurveNotInitialized`] when `generators` is not a full
/// Pedersen basis.
pub fn get_tokens_with_witness<R: Rng + CryptoRng>(
    values: &[u64],
    token_type: &str,
    generators: &[G1Affine],
    rng: &mut R,
) -> Result<(Vec<G1Affine>, Vec<TokenDataWitness>), TokenError> {
    if generators.len() != PEDERSEN_BASIS_LEN {
        return Err(TokenError::CurveNotInitialized);
    }
    let witnesses: Vec<TokenDataWitness> = values
        .iter()
        .map(|&value| TokenDataWitness {
            token_type: token_type.to_string(),
            value,
            blinding_factor: random_scalar(rng),
        })
        .collect();
    let commitments = witnesses
        .iter()
        .map(|w| commit_token(&w.token_type, Fr::from(w.value), w.blinding_factor, generators))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((commitments, witnesses))
}

/// Commit to `values` under caller-supplied blinding factors.
pub fn get_tokens_with_witness_and_bf(
    values: &[u64],
    token_type: &str,
    blinding_factors: &[Fr],
    generators: &[G1Affine],
) -> Result<Vec<G1Affine>, TokenError> {
    if generators.len() != PEDERSEN_BASIS_LEN {
        return Err(TokenError::CurveNotInitialized);
    }
    if values.len() != blinding_factors.len() {
        return Err(TokenError::LengthMismatch {
            expected: values.len(),
            got: blinding_factors.len(),
        });
    }
    values
        .iter()
        .zip(blinding_factors)
        .map(|(v, bf)| Ok(commit_token(token_type, Fr::from(*v), *bf, generators)?))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
