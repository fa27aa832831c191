//! Ledger-side validation of token requests.
//!
//! A request is accepted only if every action in it passes, in order:
//!
//! 1. **Decoding**: the action deserializes under the current protocol version.
//! 2. **Structure**: [`IssueAction::validate`] / [`TransferAction::validate`].
//! 3. **Authorisation**: the issuer is one of `pp.issuer_ids` (when that
//!    list is non-empty), for issues and for redeeming transfers alike.
//! 4. **Inputs**: spent tokens equal what the ledger holds for them. An
//!    upgraded input must name a plaintext token the ledger holds, and its
//!    witness must re-commit to the input token.
//! 5. **Proofs**: the issue or transfer proof verifies.
//! 6. **Signatures** (requests only): issuers, input owners and the auditor.
//!
//! Cheap checks run first so that invalid requests waste little CPU.
//! Signatures are Ed25519 over [`TokenRequest::message_to_sign`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::encoding::EncodingError;
use crate::identity::{verify_ed25519, Identity, IdentityError};
use crate::issue::{IssueAction, IssueError, IssueVerifier};
use crate::request::TokenRequest;
use crate::setup::PublicParams;
use crate::token::{TokenError, TypedToken};
use crate::transfer::{TransferAction, TransferError, TransferVerifier};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid issue action: {0}")]
    Issue(#[from] IssueError),

    #[error("invalid transfer action: {0}")]
    Transfer(#[from] TransferError),

    #[error("issuer [{0}] is not authorised by the public parameters")]
    UnauthorizedIssuer(String),

    #[error("redeem requires an issuer")]
    MissingIssuer,

    #[error("expected [{expected}] input tokens, got [{got}]")]
    InputCountMismatch { expected: usize, got: usize },

    #[error("input [{0}] does not match the token on the ledger")]
    InputMismatch(usize),

    #[error("upgrade witness of input [{index}] is invalid: {source}")]
    InvalidUpgradeWitness {
        index: usize,
        #[source]
        source: TokenError,
    },

    #[error("upgrade witness of input [{0}] does not re-commit to the input token")]
    UpgradeCommitmentMismatch(usize),

    #[error("upgrade witness of input [{0}] names a different owner")]
    UpgradeOwnersMismatch(usize),

    #[error("missing signature [{0}]")]
    MissingSignature(usize),

    #[error("invalid signature [{index}] by [{signer}]: {source}")]
    InvalidSignature {
        index: usize,
        signer: String,
        #[source]
        source: IdentityError,
    },

    #[error("expected [{expected}] signatures, got [{got}]")]
    UnexpectedSignatures { expected: usize, got: usize },

    #[error("auditor signature missing")]
    MissingAuditorSignature,

    #[error("invalid auditor signature: {0}")]
    InvalidAuditorSignature(#[source] IdentityError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

pub struct Validator {
    pp: Arc<PublicParams>,
}

impl Validator {
    pub fn new(pp: Arc<PublicParams>) -> Self {
        Self { pp }
    }

    fn check_issuer(&self, issuer: &Identity) -> Result<(), ValidationError> {
        let authorised = self.pp.issuers();
        if !authorised.is_empty() && !authorised.contains(issuer) {
            return Err(ValidationError::UnauthorizedIssuer(issuer.unique_id()));
        }
        Ok(())
    }

    /// Decode and fully check one serialized issue action.
    pub fn verify_issue(&self, raw: &[u8]) -> Result<IssueAction, ValidationError> {
        let action = IssueAction::deserialize(raw)?;
        action.validate()?;
        self.check_issuer(&action.issuer)?;
        IssueVerifier::new(&action.commitments()?, &self.pp).verify(&action.proof)?;
        debug!(outputs = action.num_outputs(), "issue action valid");
        Ok(action)
    }

    /// Decode and fully check one serialized transfer action.
    ///
    /// `ledger_inputs[i]` is the token the ledger holds under the id of
    /// input `i`. For an upgraded input that is the plaintext token named
    /// by its witness.
    pub fn verify_transfer(
        &self,
        raw: &[u8],
        ledger_inputs: &[TypedToken],
    ) -> Result<TransferAction, ValidationError> {
        let action = TransferAction::deserialize(raw)?;
        action.validate()?;

        if action.is_redeem() {
            let issuer = action.issuer.as_ref().ok_or(ValidationError::MissingIssuer)?;
            self.check_issuer(issuer)?;
        }

        if ledger_inputs.len() != action.num_inputs() {
            return Err(ValidationError::InputCountMismatch {
                expected: action.num_inputs(),
                got: ledger_inputs.len(),
            });
        }
        for (i, (input, on_ledger)) in action.inputs.iter().zip(ledger_inputs).enumerate() {
            let token = input.token.as_ref().ok_or(TransferError::MissingInputToken(i))?;
            match &input.upgrade_witness {
                Some(witness) => {
                    match (on_ledger, &witness.plain_token) {
                        (TypedToken::Clear(held), Some(plain)) if held == plain => {}
                        _ => return Err(ValidationError::InputMismatch(i)),
                    }
                    let recomputed = witness
                        .commitment(&self.pp)
                        .map_err(|source| ValidationError::InvalidUpgradeWitness { index: i, source })?;
                    if recomputed.data != token.data {
                        return Err(ValidationError::UpgradeCommitmentMismatch(i));
                    }
                    if recomputed.owner != token.owner {
                        return Err(ValidationError::UpgradeOwnersMismatch(i));
                    }
                }
                None => match on_ledger {
                    TypedToken::Comm(held) if held == token => {}
                    _ => return Err(ValidationError::InputMismatch(i)),
                },
            }
        }

        TransferVerifier::new(
            &action.input_commitments()?,
            &action.output_commitments()?,
            &self.pp,
        )
        .verify(&action.proof)?;
        debug!(
            inputs = action.num_inputs(),
            outputs = action.num_outputs(),
            "transfer action valid"
        );
        Ok(action)
    }

    /// Check every action of `request` and every signature over it.
    ///
    /// Signatures are expected in this order: one per issue (its issuer);
    /// then, per transfer, one per input owner followed by the issuer's
    /// when the transfer redeems. When the public parameters name an
    /// auditor, its signature must be first in `auditor_signatures`.
    pub fn verify_request(
        &self,
        request: &TokenRequest,
        anchor: &str,
        ledger_inputs: &[Vec<TypedToken>],
    ) -> Result<(), ValidationError> {
        if ledger_inputs.len() != request.transfers.len() {
            return Err(ValidationError::InputCountMismatch {
                expected: request.transfers.len(),
                got: ledger_inputs.len(),
            });
        }
        let message = request.message_to_sign(anchor)?;

        let mut signers = Vec::new();
        for raw in &request.issues {
            signers.push(self.verify_issue(raw)?.issuer);
        }
        for (raw, inputs) in request.transfers.iter().zip(ledger_inputs) {
            let action = self.verify_transfer(raw, inputs)?;
            signers.extend(action.inputs.iter().filter_map(|i| i.token.as_ref()).map(|t| t.owner.clone()));
            if action.is_redeem() {
                signers.push(action.issuer.clone().ok_or(ValidationError::MissingIssuer)?);
            }
        }

        if request.signatures.len() > signers.len() {
            return Err(ValidationError::UnexpectedSignatures {
                expected: signers.len(),
                got: request.signatures.len(),
            });
        }
        for (index, signer) in signers.iter().enumerate() {
            let signature = request
                .signatures
                .get(index)
                .ok_or(ValidationError::MissingSignature(index))?;
            verify_ed25519(signer, &message, signature).map_err(|source| {
                ValidationError::InvalidSignature {
                    index,
                    signer: signer.unique_id(),
                    source,
                }
            })?;
        }

        if let Some(auditor) = &self.pp.auditor {
            let signature = request
                .auditor_signatures
                .first()
                .ok_or(ValidationError::MissingAuditorSignature)?;
            verify_ed25519(auditor, &message, signature)
                .map_err(ValidationError::InvalidAuditorSignature)?;
        }

        info!(
            %anchor,
            issues = request.issues.len(),
            transfers = request.transfers.len(),
            signatures = signers.len(),
            "token request valid"
        );
        Ok(())
    }
}
