//! # Issue Module
//!
//! Minting of new confidential tokens. An issuer commits to one token type
//! and a list of values, proves that every output carries that same type
//! and a value in range, and wraps the result in a signed [`IssueAction`].
//!
//! ## Architecture
//!
//! ```text
//! same_type.rs — Sigma proof that a commitment-to-type opens to H(type)
//! proof.rs     — IssueProof = SameType + RangeCorrectness; prover/verifier
//! action.rs    — IssueAction wire type and structural validation
//! issuer.rs    — Issuer: tokens + witnesses + proof + action, and signing
//! ```
//!
//! ## Flow
//!
//! 1. [`Issuer::generate_zk_issue`] commits to each value under a fresh
//!    blinding factor.
//! 2. [`IssueProver`] picks a type blinding factor `tbf`, publishes
//!    `CT = H(type) * G_type + tbf * G_blind`, proves knowledge of its
//!    opening, then range-proves every `output_i - CT`.
//! 3. [`IssueVerifier`] replays both checks from the public outputs alone.

pub mod action;
pub mod issuer;
pub mod proof;
pub mod same_type;

use thiserror::Error;

use crate::encoding::EncodingError;
use crate::error::ProofError;
use crate::identity::IdentityError;
use crate::rp::RangeProofError;
use crate::token::TokenError;

pub use action::{IssueAction, IssueActionInput};
pub use issuer::Issuer;
pub use proof::{IssueProof, IssueProver, IssueVerifier};
pub use same_type::{SameType, SameTypeProver, SameTypeVerifier};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("nil signer")]
    NilSigner,

    #[error("invalid public parameters: {0}")]
    InvalidPublicParameters(String),

    #[error("failed to generate zero knowledge proof for issue: {0}")]
    GenerateZkProof(#[source] ProofError),

    #[error("failed to generate range proof for issue: {0}")]
    GenerateRangeProofFailed(#[source] RangeProofError),

    #[error("invalid issue proof: {0}")]
    InvalidIssueProof(#[source] ProofError),

    #[error("issuer is not set")]
    IssuerNotSet,

    #[error("issue action input [{0}] has no token")]
    MissingInputToken(usize),

    #[error("issue action input [{0}] has no transaction id")]
    MissingInputId(usize),

    #[error("issue action has no outputs")]
    NoOutputs,

    #[error("issue action output [{0}] is nil")]
    NilOutput(usize),

    #[error("invalid issue output at index [{index}]: {source}")]
    InvalidOutput {
        index: usize,
        #[source]
        source: TokenError,
    },

    #[error("recipient [{0}] is not defined")]
    MissingRecipient(usize),

    #[error("value [{value}] at index [{index}] exceeds the maximum token value [{max}]")]
    ValueOutOfRange { index: usize, value: u64, max: u64 },

    #[error("number of owners [{owners}] does not match number of tokens [{tokens}]")]
    OwnerTokenMismatch { owners: usize, tokens: usize },

    #[error("all outputs of an issue must share one token type")]
    MixedTokenTypes,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
