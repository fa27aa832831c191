//! Sender: spends owned commitment tokens into new outputs.

use std::sync::Arc;

use ark_std::rand::{CryptoRng, Rng};
use tracing::{debug, info};

use super::action::TransferAction;
use super::proof::TransferProver;
use super::TransferError;
use crate::identity::{Identity, SigningIdentity};
use crate::setup::PublicParams;
use crate::token::{get_tokens_with_witness, Metadata, Token, TokenDataWitness, TokenId};

/// Holds the tokens being spent together with their openings.
///
/// `signers[i]` signs for the owner of `inputs[i]`. Signers are only
/// needed by [`Sender::sign_token_actions`]; an empty list is fine for
/// proof generation. `input_metadata[i]` must open `inputs[i]`.
pub struct Sender {
    signers: Vec<Arc<dyn SigningIdentity>>,
    inputs: Vec<Token>,
    input_ids: Vec<TokenId>,
    input_metadata: Vec<Metadata>,
    pp: Arc<PublicParams>,
}

impl Sender {
    pub fn new(
        signers: Vec<Arc<dyn SigningIdentity>>,
        inputs: Vec<Token>,
        input_ids: Vec<TokenId>,
        input_metadata: Vec<Metadata>,
        pp: Arc<PublicParams>,
    ) -> Result<Self, TransferError> {
        if inputs.is_empty() {
            return Err(TransferError::NoInputs);
        }
        if input_ids.len() != inputs.len() {
            return Err(TransferError::LengthMismatch {
                what: "input ids",
                expected: inputs.len(),
                got: input_ids.len(),
            });
        }
        if input_metadata.len() != inputs.len() {
            return Err(TransferError::LengthMismatch {
                what: "input metadata",
                expected: inputs.len(),
                got: input_metadata.len(),
            });
        }
        if !signers.is_empty() && signers.len() != inputs.len() {
            return Err(TransferError::LengthMismatch {
                what: "signers",
                expected: inputs.len(),
                got: signers.len(),
            });
        }
        for (index, (token, meta)) in inputs.iter().zip(&input_metadata).enumerate() {
            token
                .to_clear(meta, &pp)
                .map_err(|source| TransferError::InvalidInput { index, source })?;
        }
        Ok(Self {
            signers,
            inputs,
            input_ids,
            input_metadata,
            pp,
        })
    }

    /// Create one output per `(value, owner)` and prove the transfer.
    ///
    /// An empty owner produces a redemption output; the caller sets
    /// [`TransferAction::issuer`] before submitting. Balance is not checked
    /// here: an unbalanced transfer yields a proof the verifier rejects.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidPublicParameters`] if `pp` does not validate.
    /// - [`TransferError::MismatchedTokenTypes`] if the inputs do not share one type.
    /// - [`TransferError::LengthMismatch`] if `owners` and `values` differ in length.
    /// - [`TransferError::GenerateZkProof`] / [`TransferError::GenerateRangeProofFailed`].
    pub fn generate_zk_transfer<R: Rng + CryptoRng>(
        &self,
        values: &[u64],
        owners: &[Identity],
        rng: &mut R,
    ) -> Result<(TransferAction, Vec<Metadata>), TransferError> {
        self.pp
            .validate()
            .map_err(|e| TransferError::InvalidPublicParameters(e.to_string()))?;
        if values.is_empty() {
            return Err(TransferError::NoOutputs);
        }
        if owners.len() != values.len() {
            return Err(TransferError::LengthMismatch {
                what: "owners",
                expected: values.len(),
                got: owners.len(),
            });
        }

        let input_witnesses = self
            .input_metadata
            .iter()
            .enumerate()
            .map(|(index, meta)| {
                TokenDataWitness::from_metadata(meta)
                    .map_err(|source| TransferError::InvalidInput { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let token_type = input_witnesses[0].token_type.clone();
        if input_witnesses.iter().any(|w| w.token_type != token_type) {
            return Err(TransferError::MismatchedTokenTypes);
        }

        let (outputs, output_witnesses) =
            get_tokens_with_witness(values, &token_type, &self.pp.pedersen_generators, rng)?;
        let inputs: Vec<_> = self.inputs.iter().map(|t| t.data).collect();

        let proof = TransferProver::new(&input_witnesses, &output_witnesses, &inputs, &outputs, &self.pp)
            .prove(rng)?
            .serialize()
            .map_err(TransferError::GenerateZkProof)?;
        let action = TransferAction::new(&self.input_ids, &self.inputs, &outputs, owners, proof)?;

        let metadata = output_witnesses.iter().map(|w| w.to_metadata(None)).collect();

        info!(
            inputs = action.num_inputs(),
            outputs = action.num_outputs(),
            token_type = %token_type,
            "transfer action generated"
        );
        Ok((action, metadata))
    }

    /// Every input owner signs `raw || tx_id`, in input order.
    pub fn sign_token_actions(&self, raw: &[u8], tx_id: &str) -> Result<Vec<Vec<u8>>, TransferError> {
        if self.signers.is_empty() {
            return Err(TransferError::NilSigner);
        }
        let mut message = Vec::with_capacity(raw.len() + tx_id.len());
        message.extend_from_slice(raw);
        message.extend_from_slice(tx_id.as_bytes());

        let signatures = self
            .signers
            .iter()
            .map(|s| s.sign(&message))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(signatures = signatures.len(), %tx_id, "token actions signed by senders");
        Ok(signatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{verify_ed25519, Ed25519Signer};
    use crate::setup::{setup, CurveId};
    use crate::token::TokenError;
    use crate::transfer::TransferVerifier;
    use ark_bn254::Fr;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn sender(values: &[u64], token_type: &str, rng: &mut StdRng) -> Sender {
        let pp = Arc::new(setup(32, b"issuer-pk", CurveId::Bn254).unwrap());
        let (coms, witnesses) =
            get_tokens_with_witness(values, token_type, &pp.pedersen_generators, rng).unwrap();
        let alice = Ed25519Signer::from_seed(&[7u8; 32]);
        let owner = alice.identity();
        let signers: Vec<Arc<dyn SigningIdentity>> =
            values.iter().map(|_| Arc::new(Ed25519Signer::from_seed(&[7u8; 32])) as _).collect();
        let tokens = coms.iter().map(|c| Token::new(owner.clone(), *c)).collect();
        let ids = (0..values.len() as u64).map(|i| TokenId::new("tx0", i)).collect();
        let meta = witnesses.iter().map(|w| w.to_metadata(None)).collect();
        Sender::new(signers, tokens, ids, meta, pp).unwrap()
    }

    #[test]
    fn generated_transfer_verifies() {
        let mut rng = StdRng::seed_from_u64(42);
        let sender = sender(&[220, 60], "ABC", &mut rng);
        let owners = [Identity::from("bob"), Identity::from("carol")];
        let (action, meta) = sender.generate_zk_transfer(&[260, 20], &owners, &mut rng).unwrap();

        action.validate().unwrap();
        TransferVerifier::new(
            &action.input_commitments().unwrap(),
            &action.output_commitments().unwrap(),
            &sender.pp,
        )
        .verify(&action.proof)
        .unwrap();

        for (i, m) in meta.iter().enumerate() {
            let clear = action.output(i).unwrap().to_clear(m, &sender.pp).unwrap();
            assert_eq!(clear.value, [260, 20][i]);
            assert_eq!(clear.token_type, "ABC");
        }
    }

    #[test]
    fn unbalanced_transfer_fails_verification() {
        let mut rng = StdRng::seed_from_u64(42);
        let sender = sender(&[90, 60], "ABC", &mut rng);
        let owners = [Identity::from("bob"), Identity::from("carol")];
        let (action, _) = sender.generate_zk_transfer(&[110, 45], &owners, &mut rng).unwrap();
        let err = TransferVerifier::new(
            &action.input_commitments().unwrap(),
            &action.output_commitments().unwrap(),
            &sender.pp,
        )
        .verify(&action.proof)
        .unwrap_err();
        assert!(matches!(err, TransferError::InvalidTransferProof(_)));
    }

    #[test]
    fn mixed_input_types_are_refused() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sender = sender(&[10, 20], "ABC", &mut rng);
        sender.input_metadata[1].token_type = "XYZ".into();
        assert!(matches!(
            sender.generate_zk_transfer(&[30], &[Identity::from("bob")], &mut rng),
            Err(TransferError::MismatchedTokenTypes)
        ));
    }

    #[test]
    fn every_signer_signs_request_and_anchor() {
        let mut rng = StdRng::seed_from_u64(3);
        let sender = sender(&[5, 6], "ABC", &mut rng);
        let sigs = sender.sign_token_actions(b"request", "tx42").unwrap();
        assert_eq!(sigs.len(), 2);
        let id = Ed25519Signer::from_seed(&[7u8; 32]).identity();
        for sig in &sigs {
            verify_ed25519(&id, b"requesttx42", sig).unwrap();
        }
    }

    #[test]
    fn signing_without_signers_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sender = sender(&[5], "ABC", &mut rng);
        sender.signers.clear();
        assert!(matches!(
            sender.sign_token_actions(b"request", "tx"),
            Err(TransferError::NilSigner)
        ));
    }

    #[test]
    fn openings_must_match_inputs() {
        let mut rng = StdRng::seed_from_u64(11);
        let pp = Arc::new(setup(32, b"issuer-pk", CurveId::Bn254).unwrap());
        let (coms, witnesses) =
            get_tokens_with_witness(&[10, 20], "ABC", &pp.pedersen_generators, &mut rng).unwrap();
        let tokens: Vec<Token> = coms.iter().map(|c| Token::new(Identity::from("alice"), *c)).collect();
        let ids = vec![TokenId::new("tx0", 0), TokenId::new("tx0", 1)];

        // Openings swapped: each one opens the other token.
        let meta = vec![witnesses[1].to_metadata(None), witnesses[0].to_metadata(None)];
        assert!(matches!(
            Sender::new(vec![], tokens.clone(), ids.clone(), meta, pp.clone()),
            Err(TransferError::InvalidInput {
                index: 0,
                source: TokenError::TokenMismatch
            })
        ));

        let mut meta: Vec<Metadata> = witnesses.iter().map(|w| w.to_metadata(None)).collect();
        meta[1].value = Some(Fr::from(21u64));
        assert!(matches!(
            Sender::new(vec![], tokens, ids, meta, pp),
            Err(TransferError::InvalidInput {
                index: 1,
                source: TokenError::TokenMismatch
            })
        ));
    }

    #[test]
    fn invalid_params_are_refused() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut sender = sender(&[10], "ABC", &mut rng);
        let mut pp = (*sender.pp).clone();
        pp.max_token = 7;
        sender.pp = Arc::new(pp);
        assert!(matches!(
            sender.generate_zk_transfer(&[10], &[Identity::from("bob")], &mut rng),
            Err(TransferError::InvalidPublicParameters(_))
        ));
    }

    #[test]
    fn inputs_must_line_up() {
        let pp = Arc::new(setup(32, b"k", CurveId::Bn254).unwrap());
        assert!(matches!(
            Sender::new(vec![], vec![], vec![], vec![], pp.clone()),
            Err(TransferError::NoInputs)
        ));
        let token = Token::new(Identity::from("a"), pp.pedersen_generators[0]);
        assert!(matches!(
            Sender::new(vec![], vec![token], vec![], vec![], pp.clone()),
            Err(TransferError::LengthMismatch { what: "input ids", .. })
        ));
        let signer: Arc<dyn SigningIdentity> = Arc::new(Ed25519Signer::from_seed(&[7u8; 32]));
        let token = Token::new(Identity::from("a"), pp.pedersen_generators[0]);
        assert!(matches!(
            Sender::new(
                vec![signer.clone(), signer],
                vec![token],
                vec![TokenId::new("tx0", 0)],
                vec![Metadata::default()],
                pp
            ),
            Err(TransferError::LengthMismatch { what: "signers", .. })
        ));
    }
}
