//! # Identities & Capabilities
//!
//! Owners, issuers, and auditors are opaque byte strings as far as the
//! token core is concerned. What those bytes mean (an Ed25519 key, an
//! anonymous credential, an HTLC script) is somebody else's problem, and
//! that somebody is injected through two capability traits:
//!
//! - [`SigningIdentity`] signs byte strings and serializes itself into the
//!   identity that appears in actions.
//! - [`InfoMatcher`] checks that an identity matches the audit information
//!   disclosed for it.
//!
//! An Ed25519 implementation of each ships here so that issuers and
//! auditors work out of the box. Private keys are never logged.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::crypto::sha256;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures inside a capability. Deliberately vague about key material.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature bytes")]
    InvalidSignatureBytes,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("identity does not match audit info")]
    AuditInfoMismatch,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identity bytes. Empty means "none" (for example a redeemed
/// output's owner).
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(Vec<u8>);

impl Identity {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Short, log-safe fingerprint: hex of the first 8 bytes of SHA-256.
    pub fn unique_id(&self) -> String {
        hex::encode(&sha256(&self.0)[..8])
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Identity(none)")
        } else {
            write!(f, "Identity({})", self.unique_id())
        }
    }
}

impl From<Vec<u8>> for Identity {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Identity {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// An identity paired with the audit information that opens it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditableIdentity {
    pub identity: Identity,
    pub audit_info: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Something that can sign on behalf of an identity.
pub trait SigningIdentity: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;

    /// The identity bytes that appear in actions.
    fn serialize(&self) -> Result<Identity, IdentityError>;
}

/// Links a disclosed identity to its audit information.
pub trait InfoMatcher: Send + Sync {
    fn match_identity(&self, identity: &Identity, audit_info: &[u8]) -> Result<(), IdentityError>;
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Ed25519 signing identity. The identity bytes are the 32-byte verifying
/// key.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Weak seed, weak key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.signing_key.verifying_key().to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signer({:?})", self.identity())
    }
}

impl SigningIdentity for Ed25519Signer {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(self.signing_key.sign(message).to_bytes().to_vec())
    }

    fn serialize(&self) -> Result<Identity, IdentityError> {
        Ok(self.identity())
    }
}

/// Verify an Ed25519 signature produced by an [`Ed25519Signer`] identity.
pub fn verify_ed25519(
    identity: &Identity,
    message: &[u8],
    signature: &[u8],
) -> Result<(), IdentityError> {
    let key_bytes: [u8; 32] = identity
        .as_bytes()
        .try_into()
        .map_err(|_| IdentityError::InvalidPublicKey)?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| IdentityError::InvalidPublicKey)?;
    let signature =
        Signature::from_slice(signature).map_err(|_| IdentityError::InvalidSignatureBytes)?;
    key.verify(message, &signature)
        .map_err(|_| IdentityError::VerificationFailed)
}

/// Matcher for enrolled identities: the audit info is the SHA-256 digest
/// of the identity, recorded when the owner enrolled with the auditor.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnrollmentMatcher;

impl EnrollmentMatcher {
    /// Audit info an owner discloses for `identity`.
    pub fn audit_info_for(identity: &Identity) -> Vec<u8> {
        sha256(identity.as_bytes()).to_vec()
    }
}

impl InfoMatcher for EnrollmentMatcher {
    fn match_identity(&self, identity: &Identity, audit_info: &[u8]) -> Result<(), IdentityError> {
        let expected = Self::audit_info_for(identity);
        if bool::from(expected.as_slice().ct_eq(audit_info)) {
            Ok(())
        } else {
            Err(IdentityError::AuditInfoMismatch)
        }
    }
}
