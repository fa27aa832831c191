//! Single-commitment range proof.
//!
//! For `com = G * v + H * bf` and `n = bit_length`, the prover commits to
//! the bit decomposition `aL` of `v` and to `aR = aL - 1`, then proves
//!
//! ```text
//! aL ∘ aR = 0,   aL - aR = 1,   <aL, 2^n> = v
//! ```
//!
//! by collapsing all three into the polynomial `t(X) = <l(X), r(X)>`,
//! committing to its coefficients `t1, t2`, and handing the evaluation at
//! the challenge `x` to the inner-product argument. A value outside
//! `[0, 2^n)` has no such decomposition and the `t(x)` check fails.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};

use super::ipa::{Ipa, IpaProver, IpaVerifier};
use super::RangeProofError;
use crate::config::RANGE_PROOF_DOMAIN;
use crate::crypto::curve::{invert, msm, random_scalar, random_scalars, to_affine};
use crate::crypto::{inner_product, powers, Transcript};
use crate::setup::RangeProofParams;

/// Commitments and scalar responses of the range proof.
/// Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct RangeProofData {
    pub t1: G1Affine,
    pub t2: G1Affine,
    pub tau: Fr,
    pub c: G1Affine,
    pub d: G1Affine,
    pub delta: Fr,
    pub inner_product: Fr,
}

#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct RangeProof {
    pub data: RangeProofData,
    pub ipa: Ipa,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `(G, H)` out of a two-element value/blinding basis.
pub(crate) fn value_basis(generators: &[G1Affine]) -> Result<(G1Affine, G1Affine), RangeProofError> {
    match generators {
        [g, h] => Ok((*g, *h)),
        _ => Err(RangeProofError::InvalidParameters(format!(
            "expected 2 Pedersen generators, got [{}]",
            generators.len()
        ))),
    }
}

struct Challenges {
    y: Fr,
    z: Fr,
}

fn challenges_yz(c: &G1Affine, d: &G1Affine, com: &G1Affine) -> Result<Challenges, RangeProofError> {
    let mut t = Transcript::new(RANGE_PROOF_DOMAIN);
    t.append_bytes(b"y");
    t.append_point(c)?;
    t.append_point(d)?;
    t.append_point(com)?;
    let y = t.challenge();

    let mut t = Transcript::new(RANGE_PROOF_DOMAIN);
    t.append_bytes(b"z");
    t.append_scalar(&y)?;
    Ok(Challenges { y, z: t.challenge() })
}

fn challenge_x(t1: &G1Affine, t2: &G1Affine, z: &Fr) -> Result<Fr, RangeProofError> {
    let mut t = Transcript::new(RANGE_PROOF_DOMAIN);
    t.append_bytes(b"x");
    t.append_point(t1)?;
    t.append_point(t2)?;
    t.append_scalar(z)?;
    Ok(t.challenge())
}

/// `H'_i = y^-i * H_i`: the right generators the IPA actually runs over.
fn scaled_right_generators(right: &[G1Affine], y: &Fr) -> Result<Vec<G1Affine>, RangeProofError> {
    let y_inv_pows = powers(invert(y)?, right.len());
    let scaled: Vec<G1Projective> = right.iter().zip(&y_inv_pows).map(|(h, s)| *h * *s).collect();
    Ok(to_affine(&scaled))
}

fn rounds(params: &RangeProofParams) -> Result<usize, RangeProofError> {
    usize::try_from(params.number_of_rounds)
        .map_err(|_| RangeProofError::InvalidParameters("number of rounds".into()))
}

// ---------------------------------------------------------------------------
// Prover
// ---------------------------------------------------------------------------

pub struct RangeProver<'a> {
    commitment: G1Affine,
    value: u64,
    blinding_factor: Fr,
    pedersen_generators: &'a [G1Affine],
    params: &'a RangeProofParams,
}

impl<'a> RangeProver<'a> {
    /// `pedersen_generators` is `(G, H)`, the value and blinding generators.
    pub fn new(
        commitment: G1Affine,
        value: u64,
        blinding_factor: Fr,
        pedersen_generators: &'a [G1Affine],
        params: &'a RangeProofParams,
    ) -> Self {
        Self {
            commitment,
            value,
            blinding_factor,
            pedersen_generators,
            params,
        }
    }

    pub fn prove<R: Rng + CryptoRng>(&self, rng: &mut R) -> Result<RangeProof, RangeProofError> {
        let (g, h) = value_basis(self.pedersen_generators)?;
        let n = self.params.left_generators.len();
        let gs = &self.params.left_generators;
        let hs = &self.params.right_generators;

        // Bits above n are dropped: an out-of-range value yields a proof
        // that does not verify.
        let a_left: Vec<Fr> = (0..n)
            .map(|i| {
                if i < 64 && (self.value >> i) & 1 == 1 {
                    Fr::one()
                } else {
                    Fr::zero()
                }
            })
            .collect();
        let a_right: Vec<Fr> = a_left.iter().map(|b| *b - Fr::one()).collect();

        let rand_left = random_scalars(rng, n);
        let rand_right = random_scalars(rng, n);
        let rho = random_scalar(rng);
        let eta = random_scalar(rng);

        let c = (msm(gs, &a_left)? + msm(hs, &a_right)? + self.params.p * rho).into_affine();
        let d = (msm(gs, &rand_left)? + msm(hs, &rand_right)? + self.params.p * eta).into_affine();

        let Challenges { y, z } = challenges_yz(&c, &d, &self.commitment)?;
        let y_pows = powers(y, n);
        let two_pows = powers(Fr::from(2u64), n);
        let z_sq = z * z;

        let left_prime: Vec<Fr> = a_left.iter().map(|a| *a - z).collect();
        let right_prime: Vec<Fr> = a_right.iter().zip(&y_pows).map(|(a, yi)| (*a + z) * yi).collect();
        let rand_right_prime: Vec<Fr> = rand_right.iter().zip(&y_pows).map(|(v, yi)| *v * yi).collect();
        let z_prime: Vec<Fr> = two_pows.iter().map(|p| z_sq * p).collect();
        let right_shifted: Vec<Fr> = right_prime.iter().zip(&z_prime).map(|(r, zp)| *r + zp).collect();

        let t1 = inner_product(&left_prime, &rand_right_prime)? + inner_product(&right_shifted, &rand_left)?;
        let t2 = inner_product(&rand_left, &rand_right_prime)?;
        let tau1 = random_scalar(rng);
        let tau2 = random_scalar(rng);
        let big_t1 = (g * t1 + h * tau1).into_affine();
        let big_t2 = (g * t2 + h * tau2).into_affine();

        let x = challenge_x(&big_t1, &big_t2, &z)?;

        let l: Vec<Fr> = left_prime.iter().zip(&rand_left).map(|(lp, u)| *lp + x * u).collect();
        let r: Vec<Fr> = right_shifted
            .iter()
            .zip(&rand_right_prime)
            .map(|(rs, v)| *rs + x * v)
            .collect();
        let tau = tau1 * x + tau2 * x * x + z_sq * self.blinding_factor;
        let delta = rho + eta * x;
        let ip = inner_product(&l, &r)?;

        let hs_prime = scaled_right_generators(hs, &y)?;
        let com_ipa = (msm(gs, &l)? + msm(&hs_prime, &r)?).into_affine();
        let ipa = IpaProver::new(
            l,
            r,
            gs,
            &hs_prime,
            self.params.q,
            com_ipa,
            ip,
            rounds(self.params)?,
        )
        .prove()?;

        Ok(RangeProof {
            data: RangeProofData {
                t1: big_t1,
                t2: big_t2,
                tau,
                c,
                d,
                delta,
                inner_product: ip,
            },
            ipa,
        })
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

pub struct RangeVerifier<'a> {
    pedersen_generators: &'a [G1Affine],
    params: &'a RangeProofParams,
}

impl<'a> RangeVerifier<'a> {
    pub fn new(pedersen_generators: &'a [G1Affine], params: &'a RangeProofParams) -> Self {
        Self {
            pedersen_generators,
            params,
        }
    }

    /// Check that `commitment` opens to a value in `[0, 2^bit_length)`.
    ///
    /// # Errors
    ///
    /// [`RangeProofError::InvalidProof`] for any failed equation. The
    /// caller learns nothing about which one.
    pub fn verify(&self, commitment: &G1Affine, proof: &RangeProof) -> Result<(), RangeProofError> {
        let (g, h) = value_basis(self.pedersen_generators)?;
        let gs = &self.params.left_generators;
        let hs = &self.params.right_generators;
        let n = gs.len();
        let data = &proof.data;

        let Challenges { y, z } = challenges_yz(&data.c, &data.d, commitment)?;
        let x = challenge_x(&data.t1, &data.t2, &z)?;
        let y_pows = powers(y, n);
        let two_pows = powers(Fr::from(2u64), n);
        let z_sq = z * z;
        let x_sq = x * x;

        // delta(y, z) = (z - z^2) * <1, y^n> - z^3 * <1, 2^n>
        let sum_y: Fr = y_pows.iter().sum();
        let sum_two: Fr = two_pows.iter().sum();
        let pol_eval = (z - z_sq) * sum_y - z_sq * z * sum_two;

        let lhs = g * data.inner_product + h * data.tau - data.t1 * x - data.t2 * x_sq;
        let rhs = *commitment * z_sq + g * pol_eval;
        if lhs != rhs {
            return Err(RangeProofError::InvalidProof);
        }

        let hs_prime = scaled_right_generators(hs, &y)?;
        let h_exponents: Vec<Fr> = y_pows
            .iter()
            .zip(&two_pows)
            .map(|(yi, ti)| z * yi + z_sq * ti)
            .collect();
        let com_ipa = data.c.into_group() + data.d * x - msm(gs, &vec![z; n])?
            + msm(&hs_prime, &h_exponents)?
            - self.params.p * data.delta;

        IpaVerifier::new(
            gs,
            &hs_prime,
            self.params.q,
            com_ipa.into_affine(),
            data.inner_product,
            rounds(self.params)?,
        )
        .verify(&proof.ipa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::commit;
    use crate::setup::pedersen_generators;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn fixture(bits: u64) -> (Vec<G1Affine>, RangeProofParams) {
        let gens = pedersen_generators().unwrap();
        (gens[1..].to_vec(), RangeProofParams::generate(bits).unwrap())
    }

    fn prove(value: u64, bits: u64, seed: u64) -> (G1Affine, RangeProof, Vec<G1Affine>, RangeProofParams) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (gens, params) = fixture(bits);
        let bf = random_scalar(&mut rng);
        let com = commit(&[Fr::from(value), bf], &gens).unwrap();
        let proof = RangeProver::new(com, value, bf, &gens, &params).prove(&mut rng).unwrap();
        (com, proof, gens, params)
    }

    #[test]
    fn values_in_range_verify() {
        for value in [0, 1, 42, 65_535] {
            let (com, proof, gens, params) = prove(value, 16, value);
            RangeVerifier::new(&gens, &params).verify(&com, &proof).unwrap();
        }
    }

    #[test]
    fn full_width_values_verify() {
        let (com, proof, gens, params) = prove(u64::MAX, 64, 1);
        RangeVerifier::new(&gens, &params).verify(&com, &proof).unwrap();
    }

    #[test]
    fn out_of_range_value_fails() {
        let (com, proof, gens, params) = prove(1 << 16, 16, 9);
        let err = RangeVerifier::new(&gens, &params).verify(&com, &proof).unwrap_err();
        assert!(matches!(err, RangeProofError::InvalidProof));
    }

    #[test]
    fn proof_is_bound_to_commitment() {
        let (_, proof, gens, params) = prove(7, 16, 3);
        let (other, _, _, _) = prove(7, 16, 4);
        assert!(RangeVerifier::new(&gens, &params).verify(&other, &proof).is_err());
    }

    #[test]
    fn tampered_scalars_fail() {
        let (com, proof, gens, params) = prove(100, 16, 5);
        let verifier = RangeVerifier::new(&gens, &params);

        let mut bad = proof.clone();
        bad.data.tau += Fr::one();
        assert!(verifier.verify(&com, &bad).is_err());

        let mut bad = proof.clone();
        bad.data.delta += Fr::one();
        assert!(verifier.verify(&com, &bad).is_err());

        let mut bad = proof;
        bad.ipa.right += Fr::one();
        assert!(verifier.verify(&com, &bad).is_err());
    }

    #[test]
    fn wrong_basis_size_is_rejected() {
        let (com, proof, _, params) = prove(1, 16, 6);
        let gens = pedersen_generators().unwrap();
        let err = RangeVerifier::new(&gens, &params).verify(&com, &proof).unwrap_err();
        assert!(matches!(err, RangeProofError::InvalidParameters(_)));
    }
}
