//! Group helpers on BN254/G1: hash-to-curve, MSM, scalar vectors.

use ark_bn254::{Fq, Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{Field, One, PrimeField, UniformRand};
use ark_std::rand::{CryptoRng, Rng};

use super::CryptoError;
use crate::config::{GENERATOR_DOMAIN, HASH_TO_CURVE_MAX_ATTEMPTS};

/// Deterministically map `label` to a G1 point of unknown discrete log.
///
/// Try-and-increment: hash `label || counter` under [`GENERATOR_DOMAIN`]
/// into an x-coordinate candidate and keep the first one that lands on the
/// curve. BN254/G1 has cofactor 1, so every curve point is in the group.
pub fn hash_to_g1(label: &[u8]) -> Result<G1Affine, CryptoError> {
    for counter in 0..HASH_TO_CURVE_MAX_ATTEMPTS {
        let mut hasher = blake3::Hasher::new_derive_key(GENERATOR_DOMAIN);
        hasher.update(&(label.len() as u64).to_le_bytes());
        hasher.update(label);
        hasher.update(&counter.to_le_bytes());
        let mut wide = [0u8; 64];
        hasher.finalize_xof().fill(&mut wide);
        let x = Fq::from_le_bytes_mod_order(&wide);

        if let Some(point) = G1Affine::get_point_from_x_unchecked(x, false) {
            let point = point.mul_by_cofactor();
            if !point.is_zero() && point.is_on_curve() {
                return Ok(point);
            }
        }
    }
    Err(CryptoError::HashToCurve(
        String::from_utf8_lossy(label).into_owned(),
    ))
}

/// `Σ scalars[i] * bases[i]`. Lengths must match.
pub fn msm(bases: &[G1Affine], scalars: &[Fr]) -> Result<G1Projective, CryptoError> {
    G1Projective::msm(bases, scalars).map_err(|_| CryptoError::LengthMismatch {
        left: bases.len(),
        right: scalars.len(),
    })
}

/// `<a, b>` over Fr.
pub fn inner_product(a: &[Fr], b: &[Fr]) -> Result<Fr, CryptoError> {
    if a.len() != b.len() {
        return Err(CryptoError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| *x * y).sum())
}

/// `[1, base, base^2, ..., base^(n-1)]`.
pub fn powers(base: Fr, n: usize) -> Vec<Fr> {
    let mut out = Vec::with_capacity(n);
    let mut acc = Fr::one();
    for _ in 0..n {
        out.push(acc);
        acc *= base;
    }
    out
}

pub fn invert(x: &Fr) -> Result<Fr, CryptoError> {
    x.inverse().ok_or(CryptoError::NotInvertible)
}

pub fn random_scalar<R: Rng + CryptoRng>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}

pub fn random_scalars<R: Rng + CryptoRng>(rng: &mut R, n: usize) -> Vec<Fr> {
    (0..n).map(|_| Fr::rand(rng)).collect()
}

/// Batch-normalize projective points.
pub fn to_affine(points: &[G1Projective]) -> Vec<G1Affine> {
    G1Projective::normalize_batch(points)
}
