//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **BLAKE3** maps data into the BN254 scalar field. Token types are
//!   hashed this way before they enter a commitment, and the transcript
//!   uses the same reduction for challenges.
//! - **SHA-256** fingerprints serialized public parameters, because that
//!   hash gets compared against values stored by systems outside this
//!   crate.
//!
//! ## hash_to_scalar
//!
//! We read 64 bytes from the BLAKE3 XOF and reduce modulo `r`. Reducing a
//! 512-bit value into a ~254-bit field leaves a statistical bias far below
//! anything observable.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

/// Bytes read from the XOF before reduction.
const WIDE_BYTES: usize = 64;

/// Context string for token-type hashing.
const TOKEN_TYPE_CONTEXT: &str = "zkatdlog v1 2026-01 token type";

/// Map arbitrary bytes to a scalar.
pub fn hash_to_scalar(data: &[u8]) -> Fr {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    wide_reduce(hasher)
}

/// Hash a token type into the exponent of `G_type`.
///
/// Types are compared by this hash only, so two distinct strings would
/// have to collide in blake3 to be confused.
pub fn hash_token_type(token_type: &str) -> Fr {
    let mut hasher = blake3::Hasher::new_derive_key(TOKEN_TYPE_CONTEXT);
    hasher.update(token_type.as_bytes());
    wide_reduce(hasher)
}

/// Finalize a BLAKE3 hasher into a uniformly distributed scalar.
pub(crate) fn wide_reduce(hasher: blake3::Hasher) -> Fr {
    let mut wide = [0u8; WIDE_BYTES];
    hasher.finalize_xof().fill(&mut wide);
    Fr::from_le_bytes_mod_order(&wide)
}

/// SHA-256 digest as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
