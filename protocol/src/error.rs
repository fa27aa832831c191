//! Errors shared by the issue and transfer proof systems.
//!
//! Each subsystem has its own error enum next to its code. What lives here
//! is the reason a *proof* was rejected, which both [`crate::issue`] and
//! [`crate::transfer`] wrap in their own "invalid proof" variant. Reasons
//! stay coarse: a verifier says which sub-proof failed, never which
//! equation inside it.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::encoding::EncodingError;
use crate::rp::RangeProofError;

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(#[from] EncodingError),

    #[error("invalid same type proof")]
    SameType,

    #[error("invalid sum and type proof")]
    TypeAndSum,

    #[error("missing proof components: {0}")]
    MissingComponents(&'static str),

    #[error("missing range correctness proof")]
    MissingRangeProof,

    #[error(transparent)]
    Range(#[from] RangeProofError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
