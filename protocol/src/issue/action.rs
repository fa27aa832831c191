//! Issue action: the ledger-facing record of a mint.

use std::collections::BTreeMap;

use ark_bn254::G1Affine;
use serde::{Deserialize, Serialize};

use super::IssueError;
use crate::encoding;
use crate::identity::Identity;
use crate::token::{Token, TokenId};

/// A token redeemed as part of an issue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueActionInput {
    pub id: TokenId,
    /// Serialized [`Token`].
    pub token: Vec<u8>,
}

/// One or more freshly minted tokens plus the proof that they are well formed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAction {
    /// Identity of the issuer, signed into the request.
    pub issuer: Identity,

    /// Tokens redeemed by this issue. Usually empty.
    pub inputs: Vec<IssueActionInput>,

    /// Newly issued tokens. `None` slots are rejected by [`Self::validate`].
    pub outputs: Vec<Option<Token>>,

    /// Serialized [`super::IssueProof`].
    pub proof: Vec<u8>,

    /// Application metadata, looked up by key only.
    pub metadata: BTreeMap<String, Vec<u8>>,
}

impl IssueAction {
    /// Pair each commitment with its owner.
    ///
    /// # Errors
    ///
    /// [`IssueError::OwnerTokenMismatch`] if the lengths differ.
    pub fn new(
        issuer: Identity,
        commitments: &[G1Affine],
        owners: &[Identity],
        proof: Vec<u8>,
    ) -> Result<Self, IssueError> {
        if owners.len() != commitments.len() {
            return Err(IssueError::OwnerTokenMismatch {
                owners: owners.len(),
                tokens: commitments.len(),
            });
        }
        let outputs = commitments
            .iter()
            .zip(owners)
            .map(|(data, owner)| Some(Token::new(owner.clone(), *data)))
            .collect();
        Ok(Self {
            issuer,
            inputs: Vec::new(),
            outputs,
            proof,
            metadata: BTreeMap::new(),
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_ids(&self) -> Vec<&TokenId> {
        self.inputs.iter().map(|i| &i.id).collect()
    }

    pub fn serialized_inputs(&self) -> Vec<&[u8]> {
        self.inputs.iter().map(|i| i.token.as_slice()).collect()
    }

    pub fn serialized_outputs(&self) -> Result<Vec<Vec<u8>>, IssueError> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let token = o.as_ref().ok_or(IssueError::NilOutput(i))?;
                Ok(token.serialize()?)
            })
            .collect()
    }

    /// Output at `index`, if present.
    pub fn output(&self, index: usize) -> Option<&Token> {
        self.outputs.get(index).and_then(Option::as_ref)
    }

    pub fn is_redeem_at(&self, index: usize) -> bool {
        self.output(index).is_some_and(Token::is_redeem)
    }

    pub fn is_graph_hiding(&self) -> bool {
        false
    }

    /// The Pedersen commitment of every output, in order.
    pub fn commitments(&self) -> Result<Vec<G1Affine>, IssueError> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, o)| o.as_ref().map(|t| t.data).ok_or(IssueError::NilOutput(i)))
            .collect()
    }

    /// Structural checks, run before any proof is looked at. Issued
    /// outputs always have an owner.
    pub fn validate(&self) -> Result<(), IssueError> {
        if self.issuer.is_none() {
            return Err(IssueError::IssuerNotSet);
        }
        for (i, input) in self.inputs.iter().enumerate() {
            if input.token.is_empty() {
                return Err(IssueError::MissingInputToken(i));
            }
            if input.id.tx_id.is_empty() {
                return Err(IssueError::MissingInputId(i));
            }
        }
        if self.outputs.is_empty() {
            return Err(IssueError::NoOutputs);
        }
        for (i, output) in self.outputs.iter().enumerate() {
            let token = output.as_ref().ok_or(IssueError::NilOutput(i))?;
            token
                .validate(true)
                .map_err(|source| IssueError::InvalidOutput { index: i, source })?;
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, IssueError> {
        Ok(encoding::encode_versioned(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, IssueError> {
        Ok(encoding::decode_versioned(raw)?)
    }
}
