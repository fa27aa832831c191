//! # Cryptographic Primitives
//!
//! Everything the proof systems need from the curve, and nothing more:
//!
//! - **hash** — blake3 hash-to-scalar, SHA-256 for parameter fingerprints.
//! - **curve** — hash-to-G1, multi-scalar multiplication, scalar vectors.
//! - **transcript** — Fiat-Shamir challenge derivation.
//! - **pedersen** — Pedersen vector commitments over the 3-element basis.
//!
//! The heavy lifting is arkworks. This module only decides *how* we call
//! it: which bytes get hashed, under which domain, in which order.

pub mod curve;
pub mod hash;
pub mod pedersen;
pub mod transcript;

use thiserror::Error;

use crate::encoding::EncodingError;

pub use curve::{hash_to_g1, inner_product, msm, powers};
pub use hash::{hash_to_scalar, hash_token_type, sha256};
pub use pedersen::{commit, commit_token, commit_type, subtract_type};
pub use transcript::Transcript;

/// Failures of the primitive layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("hash-to-curve found no point for label [{0}]")]
    HashToCurve(String),

    #[error("scalar is not invertible")]
    NotInvertible,

    #[error("expected {expected} Pedersen generators, got {got}")]
    InvalidBasis { expected: usize, got: usize },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
