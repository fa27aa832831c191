//! One range proof per commitment.

use ark_bn254::{Fr, G1Affine};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};

use super::bulletproof::{RangeProof, RangeProver, RangeVerifier};
use super::RangeProofError;
use crate::encoding::{from_canonical_bytes, to_canonical_bytes};
use crate::setup::RangeProofParams;

#[derive(Clone, Debug, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct RangeCorrectness {
    pub proofs: Vec<RangeProof>,
}

impl RangeCorrectness {
    pub fn serialize(&self) -> Result<Vec<u8>, RangeProofError> {
        Ok(to_canonical_bytes(self)?)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, RangeProofError> {
        Ok(from_canonical_bytes(raw)?)
    }
}

pub struct RangeCorrectnessProver<'a> {
    commitments: Vec<G1Affine>,
    values: Vec<u64>,
    blinding_factors: Vec<Fr>,
    pedersen_generators: &'a [G1Affine],
    params: &'a RangeProofParams,
}

impl<'a> RangeCorrectnessProver<'a> {
    pub fn new(
        commitments: Vec<G1Affine>,
        values: Vec<u64>,
        blinding_factors: Vec<Fr>,
        pedersen_generators: &'a [G1Affine],
        params: &'a RangeProofParams,
    ) -> Self {
        Self {
            commitments,
            values,
            blinding_factors,
            pedersen_generators,
            params,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<RangeCorrectness, RangeProofError> {
        let n = self.commitments.len();
        if self.values.len() != n || self.blinding_factors.len() != n {
            return Err(RangeProofError::InvalidParameters(format!(
                "[{n}] commitments but [{}] values and [{}] blinding factors",
                self.values.len(),
                self.blinding_factors.len()
            )));
        }
        let mut proofs = Vec::with_capacity(n);
        for (i, com) in self.commitments.iter().enumerate() {
            let proof = RangeProver::new(
                *com,
                self.values[i],
                self.blinding_factors[i],
                self.pedersen_generators,
                self.params,
            )
            .prove(rng)
            .map_err(|e| RangeProofError::at(i, e))?;
            proofs.push(proof);
        }
        Ok(RangeCorrectness { proofs })
    }
}

pub struct RangeCorrectnessVerifier<'a> {
    pedersen_generators: &'a [G1Affine],
    params: &'a RangeProofParams,
}

impl<'a> RangeCorrectnessVerifier<'a> {
    pub fn new(pedersen_generators: &'a [G1Affine], params: &'a RangeProofParams) -> Self {
        Self {
            pedersen_generators,
            params,
        }
    }

    pub fn verify(&self, commitments: &[G1Affine], rc: &RangeCorrectness) -> Result<(), RangeProofError> {
        if rc.proofs.len() != commitments.len() {
            return Err(RangeProofError::ProofCountMismatch {
                expected: commitments.len(),
                got: rc.proofs.len(),
            });
        }
        let verifier = RangeVerifier::new(self.pedersen_generators, self.params);
        for (i, (com, proof)) in commitments.iter().zip(&rc.proofs).enumerate() {
            verifier.verify(com, proof).map_err(|e| RangeProofError::at(i, e))?;
        }
        Ok(())
    }
}
