//! Same-type proof.
//!
//! Statement: `CT = t * G_type + tbf * G_blind` for `t = H(type)`.
//! Schnorr-style proof of knowledge of `(t, tbf)`:
//!
//! ```text
//! prover:   R   = r_t * G_type + r_bf * G_blind
//!           c   = H(basis, CT, R)
//!           z_t = c * t + r_t,   z_bf = c * tbf + r_bf
//! verifier: R'  = z_t * G_type + z_bf * G_blind - c * CT
//!           accept iff H(basis, CT, R') == c
//! ```

use ark_bn254::{Fr, G1Affine};
use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};

use crate::config::SAME_TYPE_DOMAIN;
use crate::crypto::curve::random_scalar;
use crate::crypto::pedersen::check_basis;
use crate::crypto::{hash_token_type, Transcript};
use crate::error::ProofError;

/// Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct SameType {
    pub type_response: Fr,
    pub blinding_factor: Fr,
    pub challenge: Fr,
    pub commitment_to_type: G1Affine,
}

fn challenge(generators: &[G1Affine], ct: &G1Affine, r: &G1Affine) -> Result<Fr, ProofError> {
    let mut t = Transcript::new(SAME_TYPE_DOMAIN);
    t.append_points(generators)?;
    t.append_point(ct)?;
    t.append_point(r)?;
    Ok(t.challenge())
}

pub struct SameTypeProver<'a> {
    token_type: &'a str,
    blinding_factor: Fr,
    commitment_to_type: G1Affine,
    generators: &'a [G1Affine],
}

impl<'a> SameTypeProver<'a> {
    pub fn new(
        token_type: &'a str,
        blinding_factor: Fr,
        commitment_to_type: G1Affine,
        generators: &'a [G1Affine],
    ) -> Self {
        Self {
            token_type,
            blinding_factor,
            commitment_to_type,
            generators,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<SameType, ProofError> {
        check_basis(self.generators)?;
        let r_type = random_scalar(rng);
        let r_blind = random_scalar(rng);
        let r = (self.generators[0] * r_type + self.generators[2] * r_blind).into_affine();

        let c = challenge(self.generators, &self.commitment_to_type, &r)?;
        Ok(SameType {
            type_response: c * hash_token_type(self.token_type) + r_type,
            blinding_factor: c * self.blinding_factor + r_blind,
            challenge: c,
            commitment_to_type: self.commitment_to_type,
        })
    }
}

pub struct SameTypeVerifier<'a> {
    generators: &'a [G1Affine],
}

impl<'a> SameTypeVerifier<'a> {
    pub fn new(generators: &'a [G1Affine]) -> Self {
        Self { generators }
    }

    pub fn verify(&self, proof: &SameType) -> Result<(), ProofError> {
        check_basis(self.generators)?;
        let r = self.generators[0] * proof.type_response + self.generators[2] * proof.blinding_factor
            - proof.commitment_to_type * proof.challenge;
        let c = challenge(self.generators, &proof.commitment_to_type, &r.into_affine())?;
        if c != proof.challenge {
            return Err(ProofError::SameType);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::commit_type;
    use crate::setup::pedersen_generators;
    use ark_ff::One;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn honest(rng: &mut StdRng, gens: &[G1Affine]) -> SameType {
        let tbf = random_scalar(rng);
        let ct = commit_type("ABC", tbf, gens).unwrap();
        SameTypeProver::new("ABC", tbf, ct, gens).prove(rng).unwrap()
    }

    #[test]
    fn honest_proof_verifies() {
        let mut rng = StdRng::seed_from_u64(42);
        let gens = pedersen_generators().unwrap();
        let proof = honest(&mut rng, &gens);
        SameTypeVerifier::new(&gens).verify(&proof).unwrap();
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let gens = pedersen_generators().unwrap();
        let tbf = random_scalar(&mut rng);
        let ct = commit_type("ABC", tbf, &gens).unwrap();
        let proof = SameTypeProver::new("XYZ", tbf, ct, &gens).prove(&mut rng).unwrap();
        assert!(matches!(
            SameTypeVerifier::new(&gens).verify(&proof),
            Err(ProofError::SameType)
        ));
    }

    #[test]
    fn tampered_fields_are_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let gens = pedersen_generators().unwrap();
        let proof = honest(&mut rng, &gens);
        let verifier = SameTypeVerifier::new(&gens);

        let mut bad = proof.clone();
        bad.type_response += Fr::one();
        assert!(verifier.verify(&bad).is_err());

        let mut bad = proof.clone();
        bad.blinding_factor += Fr::one();
        assert!(verifier.verify(&bad).is_err());

        let mut bad = proof.clone();
        bad.challenge += Fr::one();
        assert!(verifier.verify(&bad).is_err());

        let mut bad = proof;
        bad.commitment_to_type = gens[1];
        assert!(verifier.verify(&bad).is_err());
    }

    #[test]
    fn fresh_randomness_gives_fresh_challenges() {
        let mut rng = StdRng::seed_from_u64(42);
        let gens = pedersen_generators().unwrap();
        let a = honest(&mut rng, &gens);
        let b = honest(&mut rng, &gens);
        assert_ne!(a.challenge, b.challenge);
    }
}
