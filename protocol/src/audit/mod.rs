//! # Audit Module
//!
//! The auditor receives each token request together with the openings
//! the parties disclosed to it off-ledger. It recomputes every
//! commitment from its opening, links every owner to its audit
//! information, and only then endorses the request with a signature.
//!
//! ```text
//! TokenRequest + TokenRequestMetadata + spent inputs
//!        │
//!        ▼
//! get_audit_info_for_{issues,transfers}  →  InspectableToken per output/input
//!        │
//!        ▼
//! inspect_output / inspect_inputs / inspect_identity
//!        │
//!        ▼
//! endorse (signs message_to_sign(anchor))
//! ```
//!
//! Every failure names the index of the offending token, and nothing is
//! signed unless every check passed.

pub mod auditor;

use ark_bn254::{Fr, G1Affine};
use thiserror::Error;

use crate::crypto::CryptoError;
use crate::encoding::EncodingError;
use crate::identity::{Identity, IdentityError};
use crate::issue::IssueError;
use crate::token::{Token, TokenError};
use crate::transfer::TransferError;

pub use auditor::{get_audit_info_for_issues, get_audit_info_for_transfers, inspect_identity, Auditor};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("auditor signer is nil")]
    NilSigner,

    #[error("length of Pedersen basis != 3")]
    InvalidPedersenBasis,

    #[error("invalid output at index [{0}]")]
    InvalidOutputAtIndex(usize),

    #[error("invalid input at index [{0}]")]
    InvalidInputAtIndex(usize),

    #[error("output at index [{0}] does not match the provided opening")]
    CommitmentMismatch(usize),

    #[error("identity at index [{0}] is empty, cannot inspect it")]
    EmptyIdentity(usize),

    #[error("failed to inspect identity at index [{0}]: audit info is empty")]
    EmptyAuditInfo(usize),

    #[error("identity at index [{0}] does not match the identity in the metadata")]
    IdentityMismatch(usize),

    #[error("owner at index [{index}] does not match the provided audit info: {source}")]
    OwnerNotMatched {
        index: usize,
        #[source]
        source: IdentityError,
    },

    #[error("issue cannot redeem tokens (output [{0}])")]
    IssueRedeem(usize),

    #[error("issue output [{0}] must have at least one receiver")]
    NoReceivers(usize),

    #[error("transfer input [{0}] must have at least one sender")]
    NoSenders(usize),

    #[error("number of {what} does not match the provided metadata: [{expected}] != [{got}]")]
    MetadataCountMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("failed to deserialize issue action at index [{index}]: {source}")]
    InvalidIssueAction {
        index: usize,
        #[source]
        source: IssueError,
    },

    #[error("failed to deserialize transfer action at index [{index}]: {source}")]
    InvalidTransferAction {
        index: usize,
        #[source]
        source: TransferError,
    },

    #[error("audit of issue [{index}] failed: {source}")]
    Issue {
        index: usize,
        #[source]
        source: Box<AuditError>,
    },

    #[error("audit of transfer [{index}] failed: {source}")]
    Transfer {
        index: usize,
        #[source]
        source: Box<AuditError>,
    },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Who owns (or issued) a token, as claimed by the action and by the
/// disclosed metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InspectableIdentity {
    pub identity: Identity,
    /// The identity the metadata claims, when it names one.
    pub identity_from_meta: Option<Identity>,
    pub audit_info: Vec<u8>,
}

/// A commitment and its disclosed opening. Inputs carry no opening.
#[derive(Clone, PartialEq, Eq)]
pub struct InspectableData {
    pub commitment: G1Affine,
    pub token_type: String,
    pub value: Option<Fr>,
    pub blinding_factor: Option<Fr>,
}

impl std::fmt::Debug for InspectableData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectableData")
            .field("commitment", &self.commitment)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// A token together with everything the auditor needs to open it.
/// Built per check and dropped afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InspectableToken {
    pub identity: InspectableIdentity,
    pub data: InspectableData,
}

impl InspectableToken {
    pub fn new(
        token: &Token,
        identity_from_meta: Option<Identity>,
        audit_info: Vec<u8>,
        token_type: impl Into<String>,
        value: Option<Fr>,
        blinding_factor: Option<Fr>,
    ) -> Self {
        Self {
            identity: InspectableIdentity {
                identity: token.owner.clone(),
                identity_from_meta,
                audit_info,
            },
            data: InspectableData {
                commitment: token.data,
                token_type: token_type.into(),
                value,
                blinding_factor,
            },
        }
    }
}
