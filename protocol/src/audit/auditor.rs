use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AuditError, InspectableIdentity, InspectableToken};
use crate::config::PEDERSEN_BASIS_LEN;
use crate::crypto::commit_token;
use crate::identity::{InfoMatcher, SigningIdentity};
use crate::issue::IssueAction;
use crate::request::{IssueMetadata, TokenRequest, TokenRequestMetadata, TransferMetadata};
use crate::setup::PublicParams;
use crate::token::{Metadata, Token};
use crate::transfer::TransferAction;

/// Inspects token requests against disclosed openings and endorses the
/// ones that check out.
pub struct Auditor {
    signer: Option<Arc<dyn SigningIdentity>>,
    pp: Arc<PublicParams>,
    matcher: Arc<dyn InfoMatcher>,
}

impl Auditor {
    pub fn new(
        signer: Option<Arc<dyn SigningIdentity>>,
        pp: Arc<PublicParams>,
        matcher: Arc<dyn InfoMatcher>,
    ) -> Self {
        Self { signer, pp, matcher }
    }

    /// Sign `request` under `anchor`. Call only after [`Self::check`].
    pub fn endorse(&self, request: &TokenRequest, anchor: &str) -> Result<Vec<u8>, AuditError> {
        let message = request.message_to_sign(anchor)?;
        let signer = self.signer.as_deref().ok_or(AuditError::NilSigner)?;
        let signature = signer.sign(&message)?;
        debug!(%anchor, bytes = message.len(), "token request endorsed");
        Ok(signature)
    }

    /// [`Self::check`] then [`Self::endorse`].
    pub fn audit(
        &self,
        request: &TokenRequest,
        metadata: &TokenRequestMetadata,
        inputs: &[Vec<Token>],
        anchor: &str,
    ) -> Result<Vec<u8>, AuditError> {
        self.check(request, metadata, inputs, anchor)?;
        self.endorse(request, anchor)
    }

    /// Check every action of `request` against its disclosed metadata.
    ///
    /// `inputs[k]` holds the tokens spent by the `k`-th transfer, as
    /// resolved from the ledger by the caller.
    pub fn check(
        &self,
        request: &TokenRequest,
        metadata: &TokenRequestMetadata,
        inputs: &[Vec<Token>],
        anchor: &str,
    ) -> Result<(), AuditError> {
        let (issued, issuers) = get_audit_info_for_issues(&request.issues, &metadata.issues)?;
        self.check_issue_requests(&issued).map_err(|e| {
            warn!(%anchor, error = %e, "issue audit failed");
            e
        })?;
        for (k, issuer) in issuers.iter().enumerate() {
            inspect_identity(self.matcher.as_ref(), issuer, k).map_err(|source| AuditError::Issue {
                index: k,
                source: Box::new(source),
            })?;
        }

        let (spent, transferred) =
            get_audit_info_for_transfers(&request.transfers, &metadata.transfers, inputs)?;
        self.check_transfer_requests(&spent, &transferred).map_err(|e| {
            warn!(%anchor, error = %e, "transfer audit failed");
            e
        })?;

        info!(
            %anchor,
            issues = request.issues.len(),
            transfers = request.transfers.len(),
            "token request passed audit"
        );
        Ok(())
    }

    pub fn check_issue_requests(&self, outputs: &[Vec<InspectableToken>]) -> Result<(), AuditError> {
        for (k, issued) in outputs.iter().enumerate() {
            self.inspect_outputs(issued).map_err(|source| AuditError::Issue {
                index: k,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    pub fn check_transfer_requests(
        &self,
        inputs: &[Vec<InspectableToken>],
        outputs: &[Vec<InspectableToken>],
    ) -> Result<(), AuditError> {
        for (k, transferred) in outputs.iter().enumerate() {
            self.inspect_outputs(transferred).map_err(|source| AuditError::Transfer {
                index: k,
                source: Box::new(source),
            })?;
        }
        for (k, spent) in inputs.iter().enumerate() {
            self.inspect_inputs(spent).map_err(|source| AuditError::Transfer {
                index: k,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    pub fn inspect_outputs(&self, tokens: &[InspectableToken]) -> Result<(), AuditError> {
        tokens
            .iter()
            .enumerate()
            .try_for_each(|(i, t)| self.inspect_output(t, i))
    }

    /// Recompute the commitment from the disclosed opening and require an
    /// exact match; then, unless the output is a redemption, link the
    /// owner to its audit info.
    pub fn inspect_output(&self, output: &InspectableToken, index: usize) -> Result<(), AuditError> {
        let generators = &self.pp.pedersen_generators;
        if generators.len() != PEDERSEN_BASIS_LEN {
            return Err(AuditError::InvalidPedersenBasis);
        }
        let (Some(value), Some(bf)) = (output.data.value, output.data.blinding_factor) else {
            return Err(AuditError::InvalidOutputAtIndex(index));
        };
        let recomputed = commit_token(&output.data.token_type, value, bf, generators)?;
        if recomputed != output.data.commitment {
            return Err(AuditError::CommitmentMismatch(index));
        }
        if !output.identity.identity.is_none() {
            inspect_identity(self.matcher.as_ref(), &output.identity, index)?;
        }
        Ok(())
    }

    /// Inputs are already on the ledger; only their owners are checked.
    pub fn inspect_inputs(&self, inputs: &[InspectableToken]) -> Result<(), AuditError> {
        for (i, input) in inputs.iter().enumerate() {
            if !input.identity.identity.is_none() {
                inspect_identity(self.matcher.as_ref(), &input.identity, i)?;
            }
        }
        Ok(())
    }
}

/// Structural identity checks, then the matcher.
pub fn inspect_identity(
    matcher: &dyn InfoMatcher,
    identity: &InspectableIdentity,
    index: usize,
) -> Result<(), AuditError> {
    if identity.identity.is_none() {
        return Err(AuditError::EmptyIdentity(index));
    }
    if identity.audit_info.is_empty() {
        return Err(AuditError::EmptyAuditInfo(index));
    }
    if let Some(claimed) = &identity.identity_from_meta {
        if !claimed.is_none() && *claimed != identity.identity {
            return Err(AuditError::IdentityMismatch(index));
        }
    }
    matcher
        .match_identity(&identity.identity, &identity.audit_info)
        .map_err(|source| AuditError::OwnerNotMatched { index, source })
}

type IssueAuditInfo = (Vec<Vec<InspectableToken>>, Vec<InspectableIdentity>);

/// Pair every output of every issue with its disclosed opening.
///
/// Also returns, per issue, the issuer identity to be matched.
pub fn get_audit_info_for_issues(
    issues: &[Vec<u8>],
    metadata: &[IssueMetadata],
) -> Result<IssueAuditInfo, AuditError> {
    if issues.len() != metadata.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "issues",
            expected: issues.len(),
            got: metadata.len(),
        });
    }
    let mut outputs = Vec::with_capacity(issues.len());
    let mut issuers = Vec::with_capacity(issues.len());
    for (k, (raw, md)) in issues.iter().zip(metadata).enumerate() {
        let action = IssueAction::deserialize(raw)
            .map_err(|source| AuditError::InvalidIssueAction { index: k, source })?;
        let inspectable = issue_outputs(&action, md).map_err(|source| AuditError::Issue {
            index: k,
            source: Box::new(source),
        })?;
        outputs.push(inspectable);
        issuers.push(InspectableIdentity {
            identity: action.issuer.clone(),
            identity_from_meta: Some(md.issuer.identity.clone()),
            audit_info: md.issuer.audit_info.clone(),
        });
    }
    Ok((outputs, issuers))
}

fn issue_outputs(action: &IssueAction, md: &IssueMetadata) -> Result<Vec<InspectableToken>, AuditError> {
    if action.outputs.len() != md.outputs.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "outputs",
            expected: action.outputs.len(),
            got: md.outputs.len(),
        });
    }
    action
        .outputs
        .iter()
        .zip(&md.outputs)
        .enumerate()
        .map(|(i, (output, out_md))| {
            let token = output.as_ref().ok_or(AuditError::InvalidOutputAtIndex(i))?;
            if token.is_redeem() {
                return Err(AuditError::IssueRedeem(i));
            }
            let receiver = out_md.receivers.first().ok_or(AuditError::NoReceivers(i))?;
            let opening = Metadata::deserialize(&out_md.output_metadata)?;
            Ok(InspectableToken::new(
                token,
                Some(receiver.identity.clone()),
                receiver.audit_info.clone(),
                opening.token_type,
                opening.value,
                opening.blinding_factor,
            ))
        })
        .collect()
}

type TransferAuditInfo = (Vec<Vec<InspectableToken>>, Vec<Vec<InspectableToken>>);

/// Pair every input and output of every transfer with its disclosures.
/// Returns `(inputs, outputs)`, one vector per transfer.
pub fn get_audit_info_for_transfers(
    transfers: &[Vec<u8>],
    metadata: &[TransferMetadata],
    inputs: &[Vec<Token>],
) -> Result<TransferAuditInfo, AuditError> {
    if transfers.len() != metadata.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "transfers",
            expected: transfers.len(),
            got: metadata.len(),
        });
    }
    if inputs.len() != metadata.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "transfer input sets",
            expected: metadata.len(),
            got: inputs.len(),
        });
    }

    let mut spent = Vec::with_capacity(transfers.len());
    let mut outputs = Vec::with_capacity(transfers.len());
    for (k, ((raw, md), tokens)) in transfers.iter().zip(metadata).zip(inputs).enumerate() {
        let action = TransferAction::deserialize(raw)
            .map_err(|source| AuditError::InvalidTransferAction { index: k, source })?;
        let wrap = |source| AuditError::Transfer {
            index: k,
            source: Box::new(source),
        };
        spent.push(transfer_inputs(md, tokens).map_err(wrap)?);
        outputs.push(transfer_outputs(&action, md).map_err(wrap)?);
    }
    Ok((spent, outputs))
}

fn transfer_inputs(md: &TransferMetadata, tokens: &[Token]) -> Result<Vec<InspectableToken>, AuditError> {
    if md.inputs.len() != tokens.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "inputs",
            expected: tokens.len(),
            got: md.inputs.len(),
        });
    }
    tokens
        .iter()
        .zip(&md.inputs)
        .enumerate()
        .map(|(i, (token, in_md))| {
            let sender = in_md.senders.first().ok_or(AuditError::NoSenders(i))?;
            Ok(InspectableToken::new(
                token,
                Some(sender.identity.clone()),
                sender.audit_info.clone(),
                "",
                None,
                None,
            ))
        })
        .collect()
}

fn transfer_outputs(action: &TransferAction, md: &TransferMetadata) -> Result<Vec<InspectableToken>, AuditError> {
    if action.outputs.len() != md.outputs.len() {
        return Err(AuditError::MetadataCountMismatch {
            what: "outputs",
            expected: action.outputs.len(),
            got: md.outputs.len(),
        });
    }
    action
        .outputs
        .iter()
        .zip(&md.outputs)
        .enumerate()
        .map(|(i, (output, out_md))| {
            let token = output.as_ref().ok_or(AuditError::InvalidOutputAtIndex(i))?;
            let opening = Metadata::deserialize(&out_md.output_metadata)?;
            Ok(InspectableToken::new(
                token,
                None,
                out_md.output_audit_info.clone(),
                opening.token_type,
                opening.value,
                opening.blinding_factor,
            ))
        })
        .collect()
}
