//! Type-and-sum proof.
//!
//! Given a commitment to type `CT = t * G_type + tbf * G_blind`, shift
//! every token by it:
//!
//! ```text
//! in'_i  = in_i  - CT = v_i * G_value + (bf_i - tbf) * G_blind
//! out'_j = out_j - CT = w_j * G_value + (bf_j - tbf) * G_blind
//! sum    = Σ in'_i - Σ out'_j
//! ```
//!
//! The proof shows, under one Fiat-Shamir challenge `c`, knowledge of
//!
//! - an opening of `CT` (so the type is fixed),
//! - an opening `(v_i, bf_i - tbf)` of each `in'_i` with no `G_type`
//!   component (so every input carries that type),
//! - a discrete log of `sum` in base `G_blind` alone (so the values cancel
//!   and `Σ v_i == Σ w_j`).
//!
//! Each response is `c * witness + randomness`. The verifier rebuilds every
//! randomness commitment as `response combination - c * statement` and
//! rehashes.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};

use crate::config::TYPE_AND_SUM_DOMAIN;
use crate::crypto::curve::{random_scalar, random_scalars, to_affine};
use crate::crypto::pedersen::check_basis;
use crate::crypto::{hash_token_type, Transcript};
use crate::error::ProofError;

/// Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct TypeAndSum {
    pub commitment_to_type: G1Affine,
    pub input_blinding_factors: Vec<Fr>,
    pub input_values: Vec<Fr>,
    pub type_response: Fr,
    pub type_blinding_factor: Fr,
    pub equality_of_sum: Fr,
    pub challenge: Fr,
}

/// Secret side of the statement.
#[derive(Clone)]
pub struct TypeAndSumWitness {
    pub token_type: String,
    pub type_blinding_factor: Fr,
    pub input_values: Vec<u64>,
    pub input_blinding_factors: Vec<Fr>,
    pub output_blinding_factors: Vec<Fr>,
}

struct Statement {
    inputs: Vec<G1Affine>,
    outputs: Vec<G1Affine>,
    sum: G1Affine,
}

fn statement(inputs: &[G1Affine], outputs: &[G1Affine], ct: &G1Affine) -> Statement {
    let shift = |coms: &[G1Affine]| -> Vec<G1Projective> {
        coms.iter().map(|c| c.into_group() - *ct).collect()
    };
    let ins = shift(inputs);
    let outs = shift(outputs);
    let sum = ins.iter().sum::<G1Projective>() - outs.iter().sum::<G1Projective>();
    Statement {
        inputs: to_affine(&ins),
        outputs: to_affine(&outs),
        sum: sum.into_affine(),
    }
}

fn challenge(
    generators: &[G1Affine],
    input_commitments: &[G1Affine],
    type_commitment: &G1Affine,
    sum_commitment: &G1Affine,
    st: &Statement,
    ct: &G1Affine,
) -> Result<Fr, ProofError> {
    let mut t = Transcript::new(TYPE_AND_SUM_DOMAIN);
    t.append_points(generators)?;
    t.append_points(input_commitments)?;
    t.append_point(type_commitment)?;
    t.append_point(sum_commitment)?;
    t.append_points(&st.inputs)?;
    t.append_points(&st.outputs)?;
    t.append_point(ct)?;
    t.append_point(&st.sum)?;
    Ok(t.challenge())
}

// ---------------------------------------------------------------------------
// Prover
// ---------------------------------------------------------------------------

pub struct TypeAndSumProver<'a> {
    witness: TypeAndSumWitness,
    generators: &'a [G1Affine],
    inputs: &'a [G1Affine],
    outputs: &'a [G1Affine],
    commitment_to_type: G1Affine,
}

impl<'a> TypeAndSumProver<'a> {
    pub fn new(
        witness: TypeAndSumWitness,
        generators: &'a [G1Affine],
        inputs: &'a [G1Affine],
        outputs: &'a [G1Affine],
        commitment_to_type: G1Affine,
    ) -> Self {
        Self {
            witness,
            generators,
            inputs,
            outputs,
            commitment_to_type,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<TypeAndSum, ProofError> {
        check_basis(self.generators)?;
        let w = &self.witness;
        let n = self.inputs.len();
        if w.input_values.len() != n
            || w.input_blinding_factors.len() != n
            || w.output_blinding_factors.len() != self.outputs.len()
        {
            return Err(ProofError::MissingComponents("witness does not match statement"));
        }
        let (g_type, g_value, g_blind) = (self.generators[0], self.generators[1], self.generators[2]);
        let tbf = w.type_blinding_factor;

        let r_values = random_scalars(rng, n);
        let r_bfs = random_scalars(rng, n);
        let r_type = random_scalar(rng);
        let r_tbf = random_scalar(rng);
        let r_sum = random_scalar(rng);

        let input_commitments: Vec<G1Projective> = r_values
            .iter()
            .zip(&r_bfs)
            .map(|(v, bf)| g_value * *v + g_blind * *bf)
            .collect();
        let input_commitments = to_affine(&input_commitments);
        let type_commitment = (g_type * r_type + g_blind * r_tbf).into_affine();
        let sum_commitment = (g_blind * r_sum).into_affine();

        let st = statement(self.inputs, self.outputs, &self.commitment_to_type);
        let c = challenge(
            self.generators,
            &input_commitments,
            &type_commitment,
            &sum_commitment,
            &st,
            &self.commitment_to_type,
        )?;

        let shifted_in: Vec<Fr> = w.input_blinding_factors.iter().map(|bf| *bf - tbf).collect();
        let sum_bf = shifted_in.iter().sum::<Fr>()
            - w.output_blinding_factors.iter().map(|bf| *bf - tbf).sum::<Fr>();

        Ok(TypeAndSum {
            commitment_to_type: self.commitment_to_type,
            input_blinding_factors: shifted_in
                .iter()
                .zip(&r_bfs)
                .map(|(bf, r)| c * bf + r)
                .collect(),
            input_values: w
                .input_values
                .iter()
                .zip(&r_values)
                .map(|(v, r)| c * Fr::from(*v) + r)
                .collect(),
            type_response: c * hash_token_type(&w.token_type) + r_type,
            type_blinding_factor: c * tbf + r_tbf,
            equality_of_sum: c * sum_bf + r_sum,
            challenge: c,
        })
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

pub struct TypeAndSumVerifier<'a> {
    generators: &'a [G1Affine],
    inputs: &'a [G1Affine],
    outputs: &'a [G1Affine],
}

impl<'a> TypeAndSumVerifier<'a> {
    pub fn new(generators: &'a [G1Affine], inputs: &'a [G1Affine], outputs: &'a [G1Affine]) -> Self {
        Self {
            generators,
            inputs,
            outputs,
        }
    }

    pub fn verify(&self, proof: &TypeAndSum) -> Result<(), ProofError> {
        check_basis(self.generators)?;
        let n = self.inputs.len();
        if proof.input_values.len() != n || proof.input_blinding_factors.len() != n {
            return Err(ProofError::TypeAndSum);
        }
        let (g_type, g_value, g_blind) = (self.generators[0], self.generators[1], self.generators[2]);
        let c = proof.challenge;
        let ct = proof.commitment_to_type;
        let st = statement(self.inputs, self.outputs, &ct);

        let input_commitments: Vec<G1Projective> = st
            .inputs
            .iter()
            .zip(proof.input_values.iter().zip(&proof.input_blinding_factors))
            .map(|(com, (v, bf))| g_value * *v + g_blind * *bf - *com * c)
            .collect();
        let input_commitments = to_affine(&input_commitments);
        let type_commitment =
            (g_type * proof.type_response + g_blind * proof.type_blinding_factor - ct * c).into_affine();
        let sum_commitment = (g_blind * proof.equality_of_sum - st.sum * c).into_affine();

        let recomputed = challenge(
            self.generators,
            &input_commitments,
            &type_commitment,
            &sum_commitment,
            &st,
            &ct,
        )?;
        if recomputed != c {
            return Err(ProofError::TypeAndSum);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{commit_token, commit_type};
    use crate::setup::pedersen_generators;
    use ark_ff::One;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    struct Case {
        gens: Vec<G1Affine>,
        inputs: Vec<G1Affine>,
        outputs: Vec<G1Affine>,
        proof: TypeAndSum,
    }

    fn case(ins: &[u64], outs: &[u64], seed: u64) -> Case {
        let mut rng = StdRng::seed_from_u64(seed);
        let gens = pedersen_generators().unwrap();
        let in_bfs = random_scalars(&mut rng, ins.len());
        let out_bfs = random_scalars(&mut rng, outs.len());
        let inputs: Vec<_> = ins
            .iter()
            .zip(&in_bfs)
            .map(|(v, bf)| commit_token("ABC", Fr::from(*v), *bf, &gens).unwrap())
            .collect();
        let outputs: Vec<_> = outs
            .iter()
            .zip(&out_bfs)
            .map(|(v, bf)| commit_token("ABC", Fr::from(*v), *bf, &gens).unwrap())
            .collect();
        let tbf = random_scalar(&mut rng);
        let ct = commit_type("ABC", tbf, &gens).unwrap();
        let witness = TypeAndSumWitness {
            token_type: "ABC".into(),
            type_blinding_factor: tbf,
            input_values: ins.to_vec(),
            input_blinding_factors: in_bfs,
            output_blinding_factors: out_bfs,
        };
        let proof = TypeAndSumProver::new(witness, &gens, &inputs, &outputs, ct)
            .prove(&mut rng)
            .unwrap();
        Case { gens, inputs, outputs, proof }
    }

    fn verify(c: &Case) -> Result<(), ProofError> {
        TypeAndSumVerifier::new(&c.gens, &c.inputs, &c.outputs).verify(&c.proof)
    }

    #[test]
    fn balanced_transfer_verifies() {
        verify(&case(&[220, 60], &[260, 20], 1)).unwrap();
        verify(&case(&[5], &[5], 2)).unwrap();
        verify(&case(&[1, 2, 3], &[6], 3)).unwrap();
    }

    #[test]
    fn unbalanced_transfer_is_rejected() {
        let err = verify(&case(&[90, 60], &[110, 45], 4)).unwrap_err();
        assert!(matches!(err, ProofError::TypeAndSum));
        assert_eq!(err.to_string(), "invalid sum and type proof");
    }

    #[test]
    fn foreign_type_output_is_rejected() {
        let mut c = case(&[10], &[10], 5);
        let mut rng = StdRng::seed_from_u64(9);
        c.outputs[0] = commit_token("XYZ", Fr::from(10u64), random_scalar(&mut rng), &c.gens).unwrap();
        assert!(verify(&c).is_err());
    }

    #[test]
    fn tampering_is_detected() {
        let base = case(&[220, 60], &[260, 20], 6);

        let mut c = case(&[220, 60], &[260, 20], 6);
        c.proof.equality_of_sum += Fr::one();
        assert!(verify(&c).is_err());

        let mut c = case(&[220, 60], &[260, 20], 6);
        c.proof.input_values[1] += Fr::one();
        assert!(verify(&c).is_err());

        let mut c = case(&[220, 60], &[260, 20], 6);
        c.proof.input_blinding_factors.pop();
        assert!(matches!(verify(&c), Err(ProofError::TypeAndSum)));

        let mut c = case(&[220, 60], &[260, 20], 6);
        c.outputs.swap(0, 1);
        // order of outputs is part of the statement
        assert!(verify(&c).is_err());

        verify(&base).unwrap();
    }

    #[test]
    fn distinct_statements_have_distinct_challenges() {
        let a = case(&[10, 20], &[30], 7);
        let b = case(&[10, 20], &[15, 15], 7);
        assert_ne!(a.proof.challenge, b.proof.challenge);
    }
}
