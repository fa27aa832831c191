//! # Transfer Module
//!
//! Spending commitment tokens. A transfer consumes inputs and creates
//! outputs of the same hidden type, with equal hidden totals, and every
//! output value in range.
//!
//! ## Architecture
//!
//! ```text
//! type_and_sum.rs — Sigma proof: one type everywhere, inputs sum to outputs
//! proof.rs        — TransferProof = TypeAndSum + optional RangeCorrectness
//! action.rs       — TransferAction wire type and structural validation
//! sender.rs       — Sender: outputs + witnesses + proof + action, and signing
//! ```
//!
//! ## Ownership-only transfers
//!
//! With exactly one input and one output the range proof is skipped by
//! both prover and verifier. The type-and-sum proof already forces the
//! output to carry the input's (range-checked) value. Any other shape,
//! including balanced many-to-many transfers, carries a range proof.

pub mod action;
pub mod proof;
pub mod sender;
pub mod type_and_sum;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::error::ProofError;
use crate::identity::IdentityError;
use crate::rp::RangeProofError;
use crate::token::TokenError;

pub use action::{TransferAction, TransferActionInput};
pub use proof::{needs_range_proof, TransferProof, TransferProver, TransferVerifier};
pub use sender::Sender;
pub use type_and_sum::{TypeAndSum, TypeAndSumProver, TypeAndSumVerifier, TypeAndSumWitness};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid transfer proof: {0}")]
    InvalidTransferProof(#[source] ProofError),

    #[error("failed to generate transfer proof: {0}")]
    GenerateZkProof(#[source] ProofError),

    #[error("failed to generate range proof for transfer: {0}")]
    GenerateRangeProofFailed(#[source] RangeProofError),

    #[error("nil signer")]
    NilSigner,

    #[error("invalid public parameters: {0}")]
    InvalidPublicParameters(String),

    #[error("all input tokens must share one token type")]
    MismatchedTokenTypes,

    #[error("transfer action has no inputs")]
    NoInputs,

    #[error("transfer action has no outputs")]
    NoOutputs,

    #[error("input [{0}] has no token id")]
    MissingInputId(usize),

    #[error("input [{0}] has no token")]
    MissingInputToken(usize),

    #[error("invalid input at index [{index}]: {source}")]
    InvalidInput {
        index: usize,
        #[source]
        source: TokenError,
    },

    #[error("output [{0}] is nil")]
    NilOutput(usize),

    #[error("invalid output at index [{index}]: {source}")]
    InvalidOutput {
        index: usize,
        #[source]
        source: TokenError,
    },

    #[error("issuer must be set when redeeming tokens")]
    MissingIssuer,

    #[error("expected [{expected}] {what}, got [{got}]")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
