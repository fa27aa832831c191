//! Transfer proof: type-and-sum plus, unless the transfer is one-to-one,
//! one range proof per output.

use ark_bn254::{Fr, G1Affine};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};
use tracing::debug;

use super::type_and_sum::{TypeAndSum, TypeAndSumProver, TypeAndSumVerifier, TypeAndSumWitness};
use super::TransferError;
use crate::crypto::{commit_type, subtract_type};
use crate::crypto::curve::random_scalar;
use crate::encoding::{from_canonical_bytes, to_canonical_bytes};
use crate::error::ProofError;
use crate::rp::{RangeCorrectness, RangeCorrectnessProver, RangeCorrectnessVerifier};
use crate::setup::PublicParams;
use crate::token::TokenDataWitness;

/// Field order is the wire order. `range_correctness` is absent, not
/// empty, for one-to-one transfers.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct TransferProof {
    pub type_and_sum: TypeAndSum,
    pub range_correctness: Option<RangeCorrectness>,
}

impl TransferProof {
    pub fn serialize(&self) -> Result<Vec<u8>, ProofError> {
        Ok(to_canonical_bytes(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, ProofError> {
        Ok(from_canonical_bytes(raw)?)
    }
}

/// Exactly one input and one output is the only shape without a range proof.
pub fn needs_range_proof(inputs: usize, outputs: usize) -> bool {
    inputs != 1 || outputs != 1
}

pub struct TransferProver<'a> {
    input_witnesses: &'a [TokenDataWitness],
    output_witnesses: &'a [TokenDataWitness],
    inputs: &'a [G1Affine],
    outputs: &'a [G1Affine],
    pp: &'a PublicParams,
}

impl<'a> TransferProver<'a> {
    pub fn new(
        input_witnesses: &'a [TokenDataWitness],
        output_witnesses: &'a [TokenDataWitness],
        inputs: &'a [G1Affine],
        outputs: &'a [G1Affine],
        pp: &'a PublicParams,
    ) -> Self {
        Self {
            input_witnesses,
            output_witnesses,
            inputs,
            outputs,
            pp,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<TransferProof, TransferError> {
        let token_type = &self
            .input_witnesses
            .first()
            .ok_or(TransferError::NoInputs)?
            .token_type;
        if self.input_witnesses.len() != self.inputs.len() {
            return Err(TransferError::LengthMismatch {
                what: "input witnesses",
                expected: self.inputs.len(),
                got: self.input_witnesses.len(),
            });
        }
        if self.output_witnesses.len() != self.outputs.len() {
            return Err(TransferError::LengthMismatch {
                what: "output witnesses",
                expected: self.outputs.len(),
                got: self.output_witnesses.len(),
            });
        }
        let gens = &self.pp.pedersen_generators;

        let type_bf = random_scalar(rng);
        let ct = commit_type(token_type, type_bf, gens)
            .map_err(|e| TransferError::GenerateZkProof(e.into()))?;

        let range_correctness = if needs_range_proof(self.inputs.len(), self.outputs.len()) {
            let values = self.output_witnesses.iter().map(|w| w.value).collect();
            let blinding_factors: Vec<Fr> = self
                .output_witnesses
                .iter()
                .map(|w| w.blinding_factor - type_bf)
                .collect();
            let rc = RangeCorrectnessProver::new(
                subtract_type(self.outputs, &ct),
                values,
                blinding_factors,
                &gens[1..],
                &self.pp.range_proof_params,
            )
            .prove(rng)
            .map_err(TransferError::GenerateRangeProofFailed)?;
            Some(rc)
        } else {
            None
        };

        let witness = TypeAndSumWitness {
            token_type: token_type.clone(),
            type_blinding_factor: type_bf,
            input_values: self.input_witnesses.iter().map(|w| w.value).collect(),
            input_blinding_factors: self.input_witnesses.iter().map(|w| w.blinding_factor).collect(),
            output_blinding_factors: self.output_witnesses.iter().map(|w| w.blinding_factor).collect(),
        };
        let type_and_sum = TypeAndSumProver::new(witness, gens, self.inputs, self.outputs, ct)
            .prove(rng)
            .map_err(TransferError::GenerateZkProof)?;

        debug!(
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            range_proof = range_correctness.is_some(),
            "transfer proof generated"
        );
        Ok(TransferProof {
            type_and_sum,
            range_correctness,
        })
    }
}

pub struct TransferVerifier<'a> {
    inputs: &'a [G1Affine],
    outputs: &'a [G1Affine],
    pp: &'a PublicParams,
}

impl<'a> TransferVerifier<'a> {
    pub fn new(inputs: &'a [G1Affine], outputs: &'a [G1Affine], pp: &'a PublicParams) -> Self {
        Self {
            inputs,
            outputs,
            pp,
        }
    }

    /// Verify a serialized [`TransferProof`].
    ///
    /// The type-and-sum proof is always checked. The range proof is
    /// required, and checked, unless the transfer is one-to-one.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in [`TransferError::InvalidTransferProof`].
    pub fn verify(&self, raw: &[u8]) -> Result<(), TransferError> {
        self.verify_proof(raw)
            .map_err(TransferError::InvalidTransferProof)
    }

    fn verify_proof(&self, raw: &[u8]) -> Result<(), ProofError> {
        let proof = TransferProof::deserialize(raw)?;
        let gens = &self.pp.pedersen_generators;

        TypeAndSumVerifier::new(gens, self.inputs, self.outputs).verify(&proof.type_and_sum)?;

        if !needs_range_proof(self.inputs.len(), self.outputs.len()) {
            return Ok(());
        }
        let rc = proof
            .range_correctness
            .as_ref()
            .ok_or(ProofError::MissingRangeProof)?;
        let shifted = subtract_type(self.outputs, &proof.type_and_sum.commitment_to_type);
        RangeCorrectnessVerifier::new(&gens[1..], &self.pp.range_proof_params).verify(&shifted, rc)?;
        Ok(())
    }
}
