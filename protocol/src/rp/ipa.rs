//! # Inner-Product Argument
//!
//! Convinces a verifier that the prover knows vectors `a, b` of length
//! `2^k` such that
//!
//! ```text
//! Com = <a, Gs> + <b, Hs>      and      <a, b> = ip
//! ```
//!
//! with a proof of `2k` points and two scalars.
//!
//! ## Protocol
//!
//! 1. `x0 = H(Hs, Gs, Q, Com, ip)` and `X = x0 * Q`. Binding `ip` into
//!    the commitment gives `Com' = Com + ip * X`.
//! 2. Each round halves the vectors. With `lo`/`hi` halves:
//!
//!    ```text
//!    L = <a_lo, G_hi> + <b_hi, H_lo> + <a_lo, b_hi> * X
//!    R = <a_hi, G_lo> + <b_lo, H_hi> + <a_hi, b_lo> * X
//!    x = H(x_prev, L, R)
//!    G' = x^-1 * G_lo + x * G_hi       a' = x * a_lo + x^-1 * a_hi
//!    H' = x * H_lo + x^-1 * H_hi       b' = x^-1 * b_lo + x * b_hi
//!    ```
//!
//!    so that `Com'_next = Com' + x^2 * L + x^-2 * R`.
//! 3. After `k` rounds the prover sends the remaining scalars `a, b` and
//!    the verifier checks `Com'_final == a * G + b * H + (a * b) * X`.
//!
//! Round challenges are chained through `x_prev`, so a proof cannot be
//! spliced from rounds of different proofs.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::RangeProofError;
use crate::config::IPA_DOMAIN;
use crate::crypto::curve::{invert, msm, to_affine};
use crate::crypto::{inner_product, Transcript};

/// Proof of the inner-product relation. Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Ipa {
    /// Final folded `a`.
    pub left: Fr,
    /// Final folded `b`.
    pub right: Fr,
    /// `L` of every round.
    pub l: Vec<G1Affine>,
    /// `R` of every round.
    pub r: Vec<G1Affine>,
}

// ---------------------------------------------------------------------------
// Challenges
// ---------------------------------------------------------------------------

fn initial_challenge(
    left_generators: &[G1Affine],
    right_generators: &[G1Affine],
    q: &G1Affine,
    commitment: &G1Affine,
    inner_product: &Fr,
) -> Result<Fr, RangeProofError> {
    let mut t = Transcript::new(IPA_DOMAIN);
    t.append_bytes(b"setup");
    t.append_points(right_generators)?;
    t.append_points(left_generators)?;
    t.append_point(q)?;
    t.append_point(commitment)?;
    t.append_scalar(inner_product)?;
    Ok(t.challenge())
}

fn round_challenge(prev: &Fr, l: &G1Affine, r: &G1Affine) -> Result<Fr, RangeProofError> {
    let mut t = Transcript::new(IPA_DOMAIN);
    t.append_bytes(b"round");
    t.append_scalar(prev)?;
    t.append_point(l)?;
    t.append_point(r)?;
    Ok(t.challenge())
}

fn fold_points(lo: &[G1Affine], hi: &[G1Affine], s_lo: Fr, s_hi: Fr) -> Vec<G1Affine> {
    let folded: Vec<G1Projective> = lo
        .iter()
        .zip(hi)
        .map(|(l, h)| *l * s_lo + *h * s_hi)
        .collect();
    to_affine(&folded)
}

fn fold_scalars(lo: &[Fr], hi: &[Fr], s_lo: Fr, s_hi: Fr) -> Vec<Fr> {
    lo.iter().zip(hi).map(|(l, h)| *l * s_lo + *h * s_hi).collect()
}

fn check_shape(
    left_generators: &[G1Affine],
    right_generators: &[G1Affine],
    rounds: usize,
) -> Result<usize, RangeProofError> {
    let too_many = || RangeProofError::InvalidParameters(format!("too many rounds [{rounds}]"));
    let n = u32::try_from(rounds)
        .ok()
        .and_then(|r| 1usize.checked_shl(r))
        .ok_or_else(too_many)?;
    if left_generators.len() != n || right_generators.len() != n {
        return Err(RangeProofError::InvalidParameters(format!(
            "expected [{n}] generators per side, got [{}] and [{}]",
            left_generators.len(),
            right_generators.len()
        )));
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Prover
// ---------------------------------------------------------------------------

pub struct IpaProver<'a> {
    left_vector: Vec<Fr>,
    right_vector: Vec<Fr>,
    left_generators: &'a [G1Affine],
    right_generators: &'a [G1Affine],
    q: G1Affine,
    commitment: G1Affine,
    inner_product: Fr,
    number_of_rounds: usize,
}

impl<'a> IpaProver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        left_vector: Vec<Fr>,
        right_vector: Vec<Fr>,
        left_generators: &'a [G1Affine],
        right_generators: &'a [G1Affine],
        q: G1Affine,
        commitment: G1Affine,
        inner_product: Fr,
        number_of_rounds: usize,
    ) -> Self {
        Self {
            left_vector,
            right_vector,
            left_generators,
            right_generators,
            q,
            commitment,
            inner_product,
            number_of_rounds,
        }
    }

    pub fn prove(self) -> Result<Ipa, RangeProofError> {
        let n = check_shape(self.left_generators, self.right_generators, self.number_of_rounds)?;
        if self.left_vector.len() != n || self.right_vector.len() != n {
            return Err(RangeProofError::InvalidParameters(format!(
                "expected witness vectors of length [{n}]"
            )));
        }

        let x0 = initial_challenge(
            self.left_generators,
            self.right_generators,
            &self.q,
            &self.commitment,
            &self.inner_product,
        )?;
        let x_point = self.q * x0;

        let mut a = self.left_vector;
        let mut b = self.right_vector;
        let mut g = self.left_generators.to_vec();
        let mut h = self.right_generators.to_vec();
        let mut ls = Vec::with_capacity(self.number_of_rounds);
        let mut rs = Vec::with_capacity(self.number_of_rounds);
        let mut prev = x0;

        for _ in 0..self.number_of_rounds {
            let half = a.len() / 2;
            let (a_lo, a_hi) = a.split_at(half);
            let (b_lo, b_hi) = b.split_at(half);
            let (g_lo, g_hi) = g.split_at(half);
            let (h_lo, h_hi) = h.split_at(half);

            let l = msm(g_hi, a_lo)? + msm(h_lo, b_hi)? + x_point * inner_product(a_lo, b_hi)?;
            let r = msm(g_lo, a_hi)? + msm(h_hi, b_lo)? + x_point * inner_product(a_hi, b_lo)?;
            let (l, r) = (l.into_affine(), r.into_affine());

            let x = round_challenge(&prev, &l, &r)?;
            let x_inv = invert(&x)?;

            let next_g = fold_points(g_lo, g_hi, x_inv, x);
            let next_h = fold_points(h_lo, h_hi, x, x_inv);
            let next_a = fold_scalars(a_lo, a_hi, x, x_inv);
            let next_b = fold_scalars(b_lo, b_hi, x_inv, x);
            (g, h, a, b) = (next_g, next_h, next_a, next_b);

            ls.push(l);
            rs.push(r);
            prev = x;
        }

        Ok(Ipa {
            left: a[0],
            right: b[0],
            l: ls,
            r: rs,
        })
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

pub struct IpaVerifier<'a> {
    left_generators: &'a [G1Affine],
    right_generators: &'a [G1Affine],
    q: G1Affine,
    commitment: G1Affine,
    inner_product: Fr,
    number_of_rounds: usize,
}

impl<'a> IpaVerifier<'a> {
    pub fn new(
        left_generators: &'a [G1Affine],
        right_generators: &'a [G1Affine],
        q: G1Affine,
        commitment: G1Affine,
        inner_product: Fr,
        number_of_rounds: usize,
    ) -> Self {
        Self {
            left_generators,
            right_generators,
            q,
            commitment,
            inner_product,
            number_of_rounds,
        }
    }

    pub fn verify(&self, proof: &Ipa) -> Result<(), RangeProofError> {
        check_shape(self.left_generators, self.right_generators, self.number_of_rounds)?;
        if proof.l.len() != self.number_of_rounds || proof.r.len() != self.number_of_rounds {
            return Err(RangeProofError::Malformed(format!(
                "expected [{}] rounds, got [{}] L and [{}] R",
                self.number_of_rounds,
                proof.l.len(),
                proof.r.len()
            )));
        }

        let x0 = initial_challenge(
            self.left_generators,
            self.right_generators,
            &self.q,
            &self.commitment,
            &self.inner_product,
        )?;
        let x_point = self.q * x0;

        let mut acc: G1Projective = x_point * self.inner_product + self.commitment;
        let mut g = self.left_generators.to_vec();
        let mut h = self.right_generators.to_vec();
        let mut prev = x0;

        for (l, r) in proof.l.iter().zip(&proof.r) {
            let x = round_challenge(&prev, l, r)?;
            let x_inv = invert(&x)?;
            let x_sq = x * x;
            let x_inv_sq = x_inv * x_inv;
            acc += *l * x_sq + *r * x_inv_sq;

            let half = g.len() / 2;
            let (g_lo, g_hi) = g.split_at(half);
            let (h_lo, h_hi) = h.split_at(half);
            let next_g = fold_points(g_lo, g_hi, x_inv, x);
            let next_h = fold_points(h_lo, h_hi, x, x_inv);
            (g, h) = (next_g, next_h);
            prev = x;
        }

        let expected = g[0] * proof.left + h[0] * proof.right + x_point * (proof.left * proof.right);
        if expected != acc {
            return Err(RangeProofError::InvalidProof);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
