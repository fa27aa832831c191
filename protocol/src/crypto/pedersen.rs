//! # Pedersen Commitments over BN254/G1
//!
//! A token commitment uses a three-element basis `(G_type, G_value,
//! G_blind)`:
//!
//! ```text
//! C = H(type) * G_type + value * G_value + bf * G_blind
//! ```
//!
//! Perfectly hiding (for uniform `bf`), computationally binding under
//! DLOG, and additively homomorphic. That last property is what the proofs
//! lean on: `C - CommitmentToType` strips the type component and leaves a
//! two-generator commitment to the value, which the range proof can then
//! talk about.
//!
//! Generators come from [`crate::setup`]. Nobody knows a discrete-log
//! relation between them because they are hash-to-curve outputs.

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::{AffineRepr, CurveGroup};

use super::curve::{msm, to_affine};
use super::hash::hash_token_type;
use super::CryptoError;
use crate::config::PEDERSEN_BASIS_LEN;

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Commit to `vector` under `generators` (component-wise).
pub fn commit(vector: &[Fr], generators: &[G1Affine]) -> Result<G1Affine, CryptoError> {
    Ok(msm(generators, vector)?.into_affine())
}

/// Commit to a full token opening under the 3-element basis.
pub fn commit_token(
    token_type: &str,
    value: Fr,
    blinding_factor: Fr,
    generators: &[G1Affine],
) -> Result<G1Affine, CryptoError> {
    check_basis(generators)?;
    commit(
        &[hash_token_type(token_type), value, blinding_factor],
        generators,
    )
}

/// `H(type) * G_type + bf * G_blind`: the type-only commitment the proofs
/// subtract from every token.
pub fn commit_type(
    token_type: &str,
    blinding_factor: Fr,
    generators: &[G1Affine],
) -> Result<G1Affine, CryptoError> {
    check_basis(generators)?;
    Ok((generators[0] * hash_token_type(token_type) + generators[2] * blinding_factor).into_affine())
}

/// `com_i - ct` for every commitment: strips the type component.
pub fn subtract_type(commitments: &[G1Affine], ct: &G1Affine) -> Vec<G1Affine> {
    let shifted: Vec<G1Projective> = commitments.iter().map(|c| c.into_group() - *ct).collect();
    to_affine(&shifted)
}

pub fn check_basis(generators: &[G1Affine]) -> Result<(), CryptoError> {
    if generators.len() != PEDERSEN_BASIS_LEN {
        return Err(CryptoError::InvalidBasis {
            expected: PEDERSEN_BASIS_LEN,
            got: generators.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
