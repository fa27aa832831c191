//! Fiat-Shamir transcript.
//!
//! A thin wrapper over a keyed BLAKE3 hasher: every proof system gets its
//! own derive-key context, every appended element goes in as compressed
//! canonical bytes, and the challenge is a wide reduction of the XOF
//! output. Append order is part of the protocol.

use ark_bn254::{Fr, G1Affine};
use ark_serialize::CanonicalSerialize;

use super::hash::wide_reduce;
use crate::encoding::EncodingError;

pub struct Transcript {
    hasher: blake3::Hasher,
}

impl Transcript {
    /// Start a transcript bound to `domain`.
    pub fn new(domain: &'static str) -> Self {
        Self {
            hasher: blake3::Hasher::new_derive_key(domain),
        }
    }

    pub fn append_point(&mut self, point: &G1Affine) -> Result<(), EncodingError> {
        self.append_canonical(point)
    }

    pub fn append_points(&mut self, points: &[G1Affine]) -> Result<(), EncodingError> {
        self.hasher.update(&(points.len() as u64).to_le_bytes());
        for p in points {
            self.append_canonical(p)?;
        }
        Ok(())
    }

    pub fn append_scalar(&mut self, scalar: &Fr) -> Result<(), EncodingError> {
        self.append_canonical(scalar)
    }

    /// Raw bytes, length-prefixed so adjacent appends can't run together.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    fn append_canonical<T: CanonicalSerialize>(&mut self, value: &T) -> Result<(), EncodingError> {
        let mut buf = Vec::with_capacity(value.compressed_size());
        value.serialize_compressed(&mut buf)?;
        self.hasher.update(&buf);
        Ok(())
    }

    /// Squeeze the challenge. Consumes the transcript.
    pub fn challenge(self) -> Fr {
        wide_reduce(self.hasher)
    }
}
