//! Transfer action: the ledger-facing record of a spend.

use std::collections::BTreeMap;

use ark_bn254::G1Affine;
use serde::{Deserialize, Serialize};

use super::TransferError;
use crate::encoding;
use crate::identity::Identity;
use crate::token::{Token, TokenId, TypedToken, UpgradeWitness};

/// A spent token.
///
/// `upgrade_witness` is set when the input was issued as a plaintext
/// token and is being converted; it opens `token`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferActionInput {
    pub id: Option<TokenId>,
    pub token: Option<Token>,
    pub upgrade_witness: Option<UpgradeWitness>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAction {
    pub inputs: Vec<TransferActionInput>,

    /// Outputs with an empty owner are redemptions.
    pub outputs: Vec<Option<Token>>,

    /// Serialized [`super::TransferProof`].
    pub proof: Vec<u8>,

    pub metadata: BTreeMap<String, Vec<u8>>,

    /// Required when any output is a redemption.
    pub issuer: Option<Identity>,
}

impl TransferAction {
    pub fn new(
        input_ids: &[TokenId],
        input_tokens: &[Token],
        commitments: &[G1Affine],
        owners: &[Identity],
        proof: Vec<u8>,
    ) -> Result<Self, TransferError> {
        if input_ids.len() != input_tokens.len() {
            return Err(TransferError::LengthMismatch {
                what: "input tokens",
                expected: input_ids.len(),
                got: input_tokens.len(),
            });
        }
        if owners.len() != commitments.len() {
            return Err(TransferError::LengthMismatch {
                what: "owners",
                expected: commitments.len(),
                got: owners.len(),
            });
        }
        let inputs = input_ids
            .iter()
            .zip(input_tokens)
            .map(|(id, token)| TransferActionInput {
                id: Some(id.clone()),
                token: Some(token.clone()),
                upgrade_witness: None,
            })
            .collect();
        let outputs = commitments
            .iter()
            .zip(owners)
            .map(|(data, owner)| Some(Token::new(owner.clone(), *data)))
            .collect();
        Ok(Self {
            inputs,
            outputs,
            proof,
            metadata: BTreeMap::new(),
            issuer: None,
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_ids(&self) -> Vec<Option<&TokenId>> {
        self.inputs.iter().map(|i| i.id.as_ref()).collect()
    }

    pub fn input_tokens(&self) -> Vec<Option<&Token>> {
        self.inputs.iter().map(|i| i.token.as_ref()).collect()
    }

    pub fn input_commitments(&self) -> Result<Vec<G1Affine>, TransferError> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                input
                    .token
                    .as_ref()
                    .map(|t| t.data)
                    .ok_or(TransferError::MissingInputToken(i))
            })
            .collect()
    }

    pub fn output_commitments(&self) -> Result<Vec<G1Affine>, TransferError> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, o)| o.as_ref().map(|t| t.data).ok_or(TransferError::NilOutput(i)))
            .collect()
    }

    /// Ledger encoding of what each input spends. An upgraded input spends
    /// the plaintext token its witness names, not the commitment it carries.
    pub fn serialized_inputs(&self) -> Result<Vec<Vec<u8>>, TransferError> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, input)| {
                if let Some(plain) = input.upgrade_witness.as_ref().and_then(|w| w.plain_token.as_ref()) {
                    return Ok(TypedToken::Clear(plain.clone()).serialize()?);
                }
                let token = input.token.as_ref().ok_or(TransferError::MissingInputToken(i))?;
                Ok(token.serialize()?)
            })
            .collect()
    }

    pub fn serialized_outputs(&self) -> Result<Vec<Vec<u8>>, TransferError> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let token = o.as_ref().ok_or(TransferError::NilOutput(i))?;
                Ok(token.serialize()?)
            })
            .collect()
    }

    pub fn output(&self, index: usize) -> Option<&Token> {
        self.outputs.get(index).and_then(Option::as_ref)
    }

    pub fn is_redeem_at(&self, index: usize) -> bool {
        self.output(index).is_some_and(Token::is_redeem)
    }

    pub fn is_redeem(&self) -> bool {
        (0..self.outputs.len()).any(|i| self.is_redeem_at(i))
    }

    pub fn is_graph_hiding(&self) -> bool {
        false
    }

    /// Structural checks, run before any proof is looked at.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.inputs.is_empty() {
            return Err(TransferError::NoInputs);
        }
        for (i, input) in self.inputs.iter().enumerate() {
            match &input.id {
                Some(id) if !id.tx_id.is_empty() => {}
                _ => return Err(TransferError::MissingInputId(i)),
            }
            let token = input.token.as_ref().ok_or(TransferError::MissingInputToken(i))?;
            token
                .validate(true)
                .map_err(|source| TransferError::InvalidInput { index: i, source })?;
            if let Some(witness) = &input.upgrade_witness {
                witness
                    .validate()
                    .map_err(|source| TransferError::InvalidInput { index: i, source })?;
            }
        }

        if self.outputs.is_empty() {
            return Err(TransferError::NoOutputs);
        }
        for (i, output) in self.outputs.iter().enumerate() {
            let token = output.as_ref().ok_or(TransferError::NilOutput(i))?;
            token
                .validate(false)
                .map_err(|source| TransferError::InvalidOutput { index: i, source })?;
        }

        if self.is_redeem() && self.issuer.as_ref().map_or(true, Identity::is_none) {
            return Err(TransferError::MissingIssuer);
        }
        Ok(())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, TransferError> {
        Ok(encoding::encode_versioned(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, TransferError> {
        Ok(encoding::decode_versioned(raw)?)
    }
}
