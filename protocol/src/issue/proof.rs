//! Issue proof: same-type proof plus one range proof per output.

use ark_bn254::{Fr, G1Affine};
use ark_ec::AffineRepr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};
use tracing::debug;

use super::same_type::{SameType, SameTypeProver, SameTypeVerifier};
use super::IssueError;
use crate::crypto::curve::random_scalar;
use crate::crypto::{commit_type, subtract_type};
use crate::encoding::{from_canonical_bytes, to_canonical_bytes};
use crate::error::ProofError;
use crate::rp::{RangeCorrectness, RangeCorrectnessProver, RangeCorrectnessVerifier};
use crate::setup::PublicParams;
use crate::token::TokenDataWitness;

/// Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct IssueProof {
    pub same_type: SameType,
    pub range_correctness: RangeCorrectness,
}

impl IssueProof {
    pub fn serialize(&self) -> Result<Vec<u8>, ProofError> {
        Ok(to_canonical_bytes(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, ProofError> {
        Ok(from_canonical_bytes(raw)?)
    }
}

pub struct IssueProver<'a> {
    witnesses: &'a [TokenDataWitness],
    commitments: &'a [G1Affine],
    pp: &'a PublicParams,
}

impl<'a> IssueProver<'a> {
    pub fn new(
        witnesses: &'a [TokenDataWitness],
        commitments: &'a [G1Affine],
        pp: &'a PublicParams,
    ) -> Self {
        Self {
            witnesses,
            commitments,
            pp,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<IssueProof, IssueError> {
        let first = self.witnesses.first().ok_or(IssueError::NoOutputs)?;
        if self.witnesses.len() != self.commitments.len() {
            return Err(IssueError::OwnerTokenMismatch {
                owners: self.witnesses.len(),
                tokens: self.commitments.len(),
            });
        }
        if self.witnesses.iter().any(|w| w.token_type != first.token_type) {
            return Err(IssueError::MixedTokenTypes);
        }
        let gens = &self.pp.pedersen_generators;

        let type_bf = random_scalar(rng);
        let ct = commit_type(&first.token_type, type_bf, gens)
            .map_err(|e| IssueError::GenerateZkProof(e.into()))?;
        let same_type = SameTypeProver::new(&first.token_type, type_bf, ct, gens)
            .prove(rng)
            .map_err(IssueError::GenerateZkProof)?;

        let values: Vec<u64> = self.witnesses.iter().map(|w| w.value).collect();
        let blinding_factors: Vec<Fr> = self
            .witnesses
            .iter()
            .map(|w| w.blinding_factor - type_bf)
            .collect();
        let range_correctness = RangeCorrectnessProver::new(
            subtract_type(self.commitments, &ct),
            values,
            blinding_factors,
            &gens[1..],
            &self.pp.range_proof_params,
        )
        .prove(rng)
        .map_err(IssueError::GenerateRangeProofFailed)?;

        debug!(outputs = self.commitments.len(), "issue proof generated");
        Ok(IssueProof {
            same_type,
            range_correctness,
        })
    }
}

pub struct IssueVerifier<'a> {
    commitments: &'a [G1Affine],
    pp: &'a PublicParams,
}

impl<'a> IssueVerifier<'a> {
    pub fn new(commitments: &'a [G1Affine], pp: &'a PublicParams) -> Self {
        Self { commitments, pp }
    }

    /// Verify a serialized [`IssueProof`] against the action's outputs.
    ///
    /// # Errors
    ///
    /// Any failure (malformed bytes, same-type, range) comes back wrapped in
    /// [`IssueError::InvalidIssueProof`].
    pub fn verify(&self, raw: &[u8]) -> Result<(), IssueError> {
        self.verify_proof(raw).map_err(IssueError::InvalidIssueProof)
    }

    fn verify_proof(&self, raw: &[u8]) -> Result<(), ProofError> {
        let proof = IssueProof::deserialize(raw)?;
        let gens = &self.pp.pedersen_generators;
        if gens.len() < 3 {
            return Err(ProofError::MissingComponents("pedersen generators"));
        }
        if proof.same_type.commitment_to_type.is_zero() {
            return Err(ProofError::MissingComponents("commitment to type"));
        }

        SameTypeVerifier::new(gens).verify(&proof.same_type)?;

        let shifted = subtract_type(self.commitments, &proof.same_type.commitment_to_type);
        RangeCorrectnessVerifier::new(&gens[1..], &self.pp.range_proof_params)
            .verify(&shifted, &proof.range_correctness)?;
        Ok(())
    }
}
