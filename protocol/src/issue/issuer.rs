//! Issuer: builds a complete issue action from values and owners.

use std::sync::Arc;

use ark_std::rand::{CryptoRng, Rng};
use tracing::{debug, info};

use super::action::IssueAction;
use super::proof::IssueProver;
use super::IssueError;
use crate::identity::{Identity, SigningIdentity};
use crate::setup::PublicParams;
use crate::token::{get_tokens_with_witness, Metadata};

/// Issues tokens of a single type.
///
/// The signer is optional so that an issuer can be built for proof
/// generation alone. Anything that needs the issuer identity or a
/// signature fails with [`IssueError::NilSigner`] without one.
pub struct Issuer {
    token_type: String,
    signer: Option<Arc<dyn SigningIdentity>>,
    pp: Arc<PublicParams>,
}

impl Issuer {
    pub fn new(
        token_type: impl Into<String>,
        signer: Option<Arc<dyn SigningIdentity>>,
        pp: Arc<PublicParams>,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            signer,
            pp,
        }
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    fn signer(&self) -> Result<&dyn SigningIdentity, IssueError> {
        self.signer.as_deref().ok_or(IssueError::NilSigner)
    }

    /// Mint one output per `(value, owner)` pair.
    ///
    /// Returns the action and, for each output, the opening the issuer
    /// hands to the recipient. The openings carry the issuer identity.
    ///
    /// # Errors
    ///
    /// - [`IssueError::InvalidPublicParameters`] if `pp` does not validate.
    /// - [`IssueError::NilSigner`] if no signer was configured.
    /// - [`IssueError::MissingRecipient`] if an owner is empty.
    /// - [`IssueError::ValueOutOfRange`] if a value exceeds `pp.max_token_value()`.
    /// - [`IssueError::GenerateZkProof`] / [`IssueError::GenerateRangeProofFailed`]
    ///   if proving fails.
    pub fn generate_zk_issue<R: Rng + CryptoRng>(
        &self,
        values: &[u64],
        owners: &[Identity],
        rng: &mut R,
    ) -> Result<(IssueAction, Vec<Metadata>), IssueError> {
        self.pp
            .validate()
            .map_err(|e| IssueError::InvalidPublicParameters(e.to_string()))?;
        let issuer = self.signer()?.serialize()?;
        if values.is_empty() {
            return Err(IssueError::NoOutputs);
        }
        if owners.len() != values.len() {
            return Err(IssueError::OwnerTokenMismatch {
                owners: owners.len(),
                tokens: values.len(),
            });
        }
        if let Some(index) = owners.iter().position(Identity::is_none) {
            return Err(IssueError::MissingRecipient(index));
        }
        let max = self.pp.max_token_value();
        if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v > max) {
            return Err(IssueError::ValueOutOfRange { index, value, max });
        }

        let (commitments, witnesses) =
            get_tokens_with_witness(values, &self.token_type, &self.pp.pedersen_generators, rng)?;
        let proof = IssueProver::new(&witnesses, &commitments, &self.pp)
            .prove(rng)?
            .serialize()
            .map_err(IssueError::GenerateZkProof)?;
        let action = IssueAction::new(issuer.clone(), &commitments, owners, proof)?;

        let metadata = witnesses
            .iter()
            .map(|w| w.to_metadata(Some(issuer.clone())))
            .collect();

        info!(
            outputs = action.num_outputs(),
            issuer = %issuer.unique_id(),
            "issue action generated"
        );
        Ok((action, metadata))
    }

    /// Sign a serialized token request on behalf of the issuer.
    pub fn sign_token_actions(&self, raw: &[u8]) -> Result<Vec<u8>, IssueError> {
        let signature = self.signer()?.sign(raw)?;
        debug!(bytes = raw.len(), "token actions signed by issuer");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Ed25519Signer;
    use crate::issue::IssueVerifier;
    use crate::setup::{setup, CurveId};
    use crate::token::TokenDataWitness;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn issuer(with_signer: bool) -> Issuer {
        let pp = Arc::new(setup(32, b"issuer-pk", CurveId::Bn254).unwrap());
        let signer: Option<Arc<dyn SigningIdentity>> = if with_signer {
            Some(Arc::new(Ed25519Signer::from_seed(&[1u8; 32])))
        } else {
            None
        };
        Issuer::new("ABC", signer, pp)
    }

    #[test]
    fn generated_issue_verifies() {
        let mut rng = StdRng::seed_from_u64(42);
        let issuer = issuer(true);
        let owners = [Identity::from("alice"), Identity::from("bob")];
        let (action, meta) = issuer.generate_zk_issue(&[10, 20], &owners, &mut rng).unwrap();

        action.validate().unwrap();
        IssueVerifier::new(&action.commitments().unwrap(), &issuer.pp)
            .verify(&action.proof)
            .unwrap();

        assert_eq!(meta.len(), 2);
        for (i, m) in meta.iter().enumerate() {
            m.validate(true).unwrap();
            let w = TokenDataWitness::from_metadata(m).unwrap();
            assert_eq!(w.value, [10, 20][i]);
            let clear = action.outputs[i].as_ref().unwrap().to_clear(m, &issuer.pp).unwrap();
            assert_eq!(clear.owner, owners[i]);
        }
    }

    #[test]
    fn missing_signer_is_reported() {
        let mut rng = StdRng::seed_from_u64(42);
        let issuer = issuer(false);
        assert!(matches!(
            issuer.generate_zk_issue(&[1], &[Identity::from("a")], &mut rng),
            Err(IssueError::NilSigner)
        ));
        assert!(matches!(issuer.sign_token_actions(b"req"), Err(IssueError::NilSigner)));
    }

    #[test]
    fn owners_must_match_values() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = issuer(true)
            .generate_zk_issue(&[1, 2], &[Identity::from("a")], &mut rng)
            .unwrap_err();
        assert!(matches!(err, IssueError::OwnerTokenMismatch { owners: 1, tokens: 2 }));
    }

    #[test]
    fn every_recipient_must_be_defined() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = issuer(true)
            .generate_zk_issue(&[1, 2], &[Identity::from("a"), Identity::none()], &mut rng)
            .unwrap_err();
        assert!(matches!(err, IssueError::MissingRecipient(1)));
    }

    #[test]
    fn values_above_the_maximum_are_refused() {
        let mut rng = StdRng::seed_from_u64(42);
        let issuer = issuer(true);
        let max = issuer.pp.max_token_value();
        let owners = [Identity::from("a"), Identity::from("b")];
        let err = issuer.generate_zk_issue(&[max, max + 1], &owners, &mut rng).unwrap_err();
        assert!(matches!(err, IssueError::ValueOutOfRange { index: 1, value, max: m } if value == max + 1 && m == max));
    }

    #[test]
    fn signs_with_configured_identity() {
        let issuer = issuer(true);
        let sig = issuer.sign_token_actions(b"request").unwrap();
        let id = Ed25519Signer::from_seed(&[1u8; 32]).identity();
        crate::identity::verify_ed25519(&id, b"request", &sig).unwrap();
    }

    #[test]
    fn invalid_params_are_refused() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pp = setup(32, b"issuer-pk", CurveId::Bn254).unwrap();
        pp.pedersen_generators.pop();
        let signer: Arc<dyn SigningIdentity> = Arc::new(Ed25519Signer::from_seed(&[1u8; 32]));
        let issuer = Issuer::new("ABC", Some(signer), Arc::new(pp));
        assert!(matches!(
            issuer.generate_zk_issue(&[1], &[Identity::from("a")], &mut rng),
            Err(IssueError::InvalidPublicParameters(_))
        ));
    }
}
