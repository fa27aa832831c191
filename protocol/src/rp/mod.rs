//! # Range Proofs
//!
//! Proves that a Pedersen commitment `com = G * v + H * bf` opens to a
//! value `v` in `[0, 2^n)` without revealing `v`.
//!
//! ## Layers
//!
//! - [`ipa`] — logarithmic-size inner-product argument.
//! - [`bulletproof`] — single-commitment range proof; reduces the bit
//!   decomposition of `v` to one inner-product claim.
//! - [`range_correctness`] — one range proof per commitment, with the
//!   offending index on failure.
//!
//! `G` and `H` are the value and blinding generators of the Pedersen
//! basis. The token-type generator never appears here: callers subtract
//! the commitment to type first.

pub mod bulletproof;
pub mod ipa;
pub mod range_correctness;

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::encoding::EncodingError;

pub use bulletproof::{RangeProof, RangeProofData, RangeProver, RangeVerifier};
pub use ipa::{Ipa, IpaProver, IpaVerifier};
pub use range_correctness::{RangeCorrectness, RangeCorrectnessProver, RangeCorrectnessVerifier};

#[derive(Debug, Error)]
pub enum RangeProofError {
    #[error("invalid range proof")]
    InvalidProof,

    #[error("invalid range proof at index {index}: {source}")]
    AtIndex {
        index: usize,
        #[source]
        source: Box<RangeProofError>,
    },

    #[error("expected [{expected}] range proofs, got [{got}]")]
    ProofCountMismatch { expected: usize, got: usize },

    #[error("malformed range proof: {0}")]
    Malformed(String),

    #[error("invalid range proof parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl RangeProofError {
    pub(crate) fn at(index: usize, source: RangeProofError) -> Self {
        RangeProofError::AtIndex {
            index,
            source: Box::new(source),
        }
    }
}
