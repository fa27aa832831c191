//! End-to-end tests for confidential tokens.
//!
//! Each test walks a realistic flow: parameters, issuance, transfer,
//! audit, ledger validation. Every test builds its own parameters and
//! seeds its own RNG; nothing is shared between tests.

use std::sync::Arc;

use ark_bn254::{Fr, G1Affine};
use ark_ec::AffineRepr;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use zkatdlog::audit::{AuditError, Auditor};
use zkatdlog::encoding::{to_canonical_bytes, EncodingError};
use zkatdlog::identity::{AuditableIdentity, Ed25519Signer, EnrollmentMatcher, Identity, SigningIdentity};
use zkatdlog::issue::{IssueAction, IssueError, IssueProof, IssueVerifier, Issuer};
use zkatdlog::request::{
    IssueMetadata, IssueOutputMetadata, TokenRequest, TokenRequestMetadata, TransferInputMetadata,
    TransferMetadata, TransferOutputMetadata,
};
use zkatdlog::setup::{setup, CurveId, PublicParams};
use zkatdlog::token::{Metadata, Token, TokenId, TypedToken};
use zkatdlog::transfer::{Sender, TransferAction, TransferError, TransferProof, TransferVerifier};
use zkatdlog::validator::{ValidationError, Validator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Party {
    signer: Arc<Ed25519Signer>,
}

impl Party {
    fn new(seed: u8) -> Self {
        Self {
            signer: Arc::new(Ed25519Signer::from_seed(&[seed; 32])),
        }
    }

    fn id(&self) -> Identity {
        self.signer.identity()
    }

    fn auditable(&self) -> AuditableIdentity {
        AuditableIdentity {
            identity: self.id(),
            audit_info: EnrollmentMatcher::audit_info_for(&self.id()),
        }
    }

    fn signing(&self) -> Arc<dyn SigningIdentity> {
        self.signer.clone()
    }
}

fn params(bit_length: u64) -> Arc<PublicParams> {
    Arc::new(setup(bit_length, b"issuer-public-key", CurveId::Bn254).expect("setup"))
}

fn auditor(pp: &Arc<PublicParams>, party: &Party) -> Auditor {
    Auditor::new(Some(party.signing()), pp.clone(), Arc::new(EnrollmentMatcher))
}

/// Issue `values` of "ABC" to `owner`; returns the action and the openings.
fn issue_to(
    pp: &Arc<PublicParams>,
    issuer: &Party,
    owner: &Party,
    values: &[u64],
    rng: &mut StdRng,
) -> (IssueAction, Vec<Metadata>) {
    let owners: Vec<_> = values.iter().map(|_| owner.id()).collect();
    Issuer::new("ABC", Some(issuer.signing()), pp.clone())
        .generate_zk_issue(values, &owners, rng)
        .expect("issue")
}

/// The ledger's view of spent commitment tokens.
fn held(tokens: &[Token]) -> Vec<TypedToken> {
    tokens.iter().cloned().map(TypedToken::from).collect()
}

fn issue_metadata(issuer: &Party, owner: &Party, meta: &[Metadata]) -> IssueMetadata {
    IssueMetadata {
        issuer: issuer.auditable(),
        outputs: meta
            .iter()
            .map(|m| IssueOutputMetadata {
                output_metadata: m.serialize().unwrap(),
                receivers: vec![owner.auditable()],
            })
            .collect(),
    }
}

/// Spend every output of `issued` owned by `from`.
fn spend(
    pp: &Arc<PublicParams>,
    from: &Party,
    issued: &IssueAction,
    meta: &[Metadata],
) -> (Sender, Vec<Token>) {
    let tokens: Vec<Token> = issued.outputs.iter().flatten().cloned().collect();
    let ids = (0..tokens.len() as u64).map(|i| TokenId::new("issue-tx", i)).collect();
    let signers = tokens.iter().map(|_| from.signing()).collect();
    let sender = Sender::new(signers, tokens.clone(), ids, meta.to_vec(), pp.clone()).expect("sender");
    (sender, tokens)
}

fn transfer_metadata(from: &Party, to: &[&Party], inputs: usize, meta: &[Metadata]) -> TransferMetadata {
    TransferMetadata {
        inputs: (0..inputs)
            .map(|_| TransferInputMetadata {
                senders: vec![from.auditable()],
            })
            .collect(),
        outputs: meta
            .iter()
            .zip(to)
            .map(|(m, p)| TransferOutputMetadata {
                output_metadata: m.serialize().unwrap(),
                output_audit_info: p.auditable().audit_info,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

#[test]
fn issue_then_tamper_with_output() {
    let mut rng = StdRng::seed_from_u64(1);
    let pp = params(32);
    let (issuer, alice) = (Party::new(1), Party::new(2));
    let (action, meta) = issue_to(&pp, &issuer, &alice, &[10, 20], &mut rng);

    IssueVerifier::new(&action.commitments().unwrap(), &pp)
        .verify(&action.proof)
        .expect("honest issue verifies");
    for (i, m) in meta.iter().enumerate() {
        let clear = action.outputs[i].as_ref().unwrap().to_clear(m, &pp).unwrap();
        assert_eq!((clear.token_type.as_str(), clear.value), ("ABC", [10, 20][i]));
        assert_eq!(clear.quantity(), format!("0x{:x}", [10, 20][i]));
    }

    let mut forged = action.clone();
    forged.outputs[0] = Some(Token::new(alice.id(), G1Affine::generator()));
    let err = IssueVerifier::new(&forged.commitments().unwrap(), &pp)
        .verify(&forged.proof)
        .unwrap_err();
    assert!(matches!(err, IssueError::InvalidIssueProof(_)));
}

#[test]
fn issue_action_survives_the_wire() {
    let mut rng = StdRng::seed_from_u64(2);
    let pp = params(32);
    let (action, _) = issue_to(&pp, &Party::new(1), &Party::new(2), &[7, 8, 9], &mut rng);

    let raw = action.serialize().unwrap();
    let back = IssueAction::deserialize(&raw).unwrap();
    assert_eq!(back, action);
    IssueVerifier::new(&back.commitments().unwrap(), &pp)
        .verify(&back.proof)
        .unwrap();

    let proof = IssueProof::deserialize(&action.proof).unwrap();
    assert_eq!(proof.serialize().unwrap(), action.proof);
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

#[test]
fn balanced_transfer_verifies() {
    let mut rng = StdRng::seed_from_u64(3);
    let pp = params(32);
    let (issuer, alice, bob, carol) = (Party::new(1), Party::new(2), Party::new(3), Party::new(4));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[220, 60], &mut rng);
    let (sender, _) = spend(&pp, &alice, &issued, &meta);

    let (action, out_meta) = sender
        .generate_zk_transfer(&[260, 20], &[bob.id(), carol.id()], &mut rng)
        .unwrap();
    action.validate().unwrap();
    TransferVerifier::new(
        &action.input_commitments().unwrap(),
        &action.output_commitments().unwrap(),
        &pp,
    )
    .verify(&action.proof)
    .unwrap();

    let proof = TransferProof::deserialize(&action.proof).unwrap();
    assert!(proof.range_correctness.is_some());
    assert_eq!(action.output(0).unwrap().to_clear(&out_meta[0], &pp).unwrap().value, 260);
}

#[test]
fn unbalanced_transfer_is_rejected() {
    let mut rng = StdRng::seed_from_u64(4);
    let pp = params(32);
    let (issuer, alice, bob) = (Party::new(1), Party::new(2), Party::new(3));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[90, 60], &mut rng);
    let (sender, _) = spend(&pp, &alice, &issued, &meta);

    let (action, _) = sender
        .generate_zk_transfer(&[110, 45], &[bob.id(), bob.id()], &mut rng)
        .unwrap();
    let err = TransferVerifier::new(
        &action.input_commitments().unwrap(),
        &action.output_commitments().unwrap(),
        &pp,
    )
    .verify(&action.proof)
    .unwrap_err();
    assert!(matches!(err, TransferError::InvalidTransferProof(_)));
}

#[test]
fn out_of_range_output_is_rejected() {
    let mut rng = StdRng::seed_from_u64(5);
    let pp = params(16);
    let (issuer, alice, bob) = (Party::new(1), Party::new(2), Party::new(3));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[60_000, 60_000], &mut rng);
    let (sender, _) = spend(&pp, &alice, &issued, &meta);

    // Balanced, but 120_000 does not fit in 16 bits.
    let (action, _) = sender
        .generate_zk_transfer(&[120_000, 0], &[bob.id(), bob.id()], &mut rng)
        .unwrap();
    assert!(TransferVerifier::new(
        &action.input_commitments().unwrap(),
        &action.output_commitments().unwrap(),
        &pp,
    )
    .verify(&action.proof)
    .is_err());
}

#[test]
fn ownership_transfer_has_no_range_proof() {
    let mut rng = StdRng::seed_from_u64(6);
    let pp = params(32);
    let (issuer, alice, bob) = (Party::new(1), Party::new(2), Party::new(3));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[33], &mut rng);
    let (sender, _) = spend(&pp, &alice, &issued, &meta);

    let (action, _) = sender.generate_zk_transfer(&[33], &[bob.id()], &mut rng).unwrap();
    let proof = TransferProof::deserialize(&action.proof).unwrap();
    assert!(proof.range_correctness.is_none());
    TransferVerifier::new(
        &action.input_commitments().unwrap(),
        &action.output_commitments().unwrap(),
        &pp,
    )
    .verify(&action.proof)
    .unwrap();
}

#[test]
fn tampered_transfer_proof_is_rejected() {
    let mut rng = StdRng::seed_from_u64(7);
    let pp = params(32);
    let (issuer, alice, bob) = (Party::new(1), Party::new(2), Party::new(3));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[5, 5], &mut rng);
    let (sender, _) = spend(&pp, &alice, &issued, &meta);
    let (action, _) = sender.generate_zk_transfer(&[10], &[bob.id()], &mut rng).unwrap();
    let inputs = action.input_commitments().unwrap();
    let outputs = action.output_commitments().unwrap();

    let mut proof = TransferProof::deserialize(&action.proof).unwrap();
    proof.type_and_sum.equality_of_sum += Fr::from(1u64);
    let err = TransferVerifier::new(&inputs, &outputs, &pp)
        .verify(&proof.serialize().unwrap())
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidTransferProof(_)));

    let mut truncated = action.proof.clone();
    truncated.truncate(truncated.len() / 2);
    assert!(TransferVerifier::new(&inputs, &outputs, &pp).verify(&truncated).is_err());

    // One flipped bit in the encoded challenge.
    let challenge = to_canonical_bytes(&proof.type_and_sum.challenge).unwrap();
    let at = action
        .proof
        .windows(challenge.len())
        .position(|w| w == challenge.as_slice())
        .expect("challenge is in the encoding");
    let mut flipped = action.proof.clone();
    flipped[at] ^= 1;
    let err = TransferVerifier::new(&inputs, &outputs, &pp)
        .verify(&flipped)
        .unwrap_err();
    assert!(matches!(err, TransferError::InvalidTransferProof(_)));

    // One flipped bit in the envelope version.
    let mut raw = action.serialize().unwrap();
    raw[0] ^= 1;
    assert!(matches!(
        TransferAction::deserialize(&raw),
        Err(TransferError::Encoding(EncodingError::InvalidProtocolVersion { expected: 1, got: 0 }))
    ));
}

#[test]
fn distinct_statements_get_distinct_challenges() {
    let mut rng = StdRng::seed_from_u64(8);
    let pp = params(32);
    let (issuer, alice) = (Party::new(1), Party::new(2));
    let (a, _) = issue_to(&pp, &issuer, &alice, &[1, 2], &mut rng);
    let (b, _) = issue_to(&pp, &issuer, &alice, &[1, 2], &mut rng);
    let pa = IssueProof::deserialize(&a.proof).unwrap();
    let pb = IssueProof::deserialize(&b.proof).unwrap();
    assert_ne!(pa.same_type.challenge, pb.same_type.challenge);
    assert_ne!(pa.same_type.commitment_to_type, pb.same_type.commitment_to_type);
}

// ---------------------------------------------------------------------------
// Audit and validation
// ---------------------------------------------------------------------------

#[test]
fn full_request_is_audited_and_validated() {
    let mut rng = StdRng::seed_from_u64(9);
    let (issuer, alice, bob, carol, auditor_party) =
        (Party::new(1), Party::new(2), Party::new(3), Party::new(4), Party::new(5));
    let mut pp = setup(32, b"issuer-public-key", CurveId::Bn254).unwrap();
    pp.add_issuer(issuer.id());
    pp.add_auditor(auditor_party.id());
    let pp = Arc::new(pp);
    let auditor = auditor(&pp, &auditor_party);
    let validator = Validator::new(pp.clone());

    // Issue to alice.
    let (issued, issued_meta) = issue_to(&pp, &issuer, &alice, &[220, 60], &mut rng);
    let mut issue_req = TokenRequest {
        issues: vec![issued.serialize().unwrap()],
        ..Default::default()
    };
    let issue_md = TokenRequestMetadata {
        issues: vec![issue_metadata(&issuer, &alice, &issued_meta)],
        transfers: vec![],
    };
    issue_req.auditor_signatures.push(auditor.audit(&issue_req, &issue_md, &[], "tx-issue").unwrap());
    let signature = Issuer::new("ABC", Some(issuer.signing()), pp.clone())
        .sign_token_actions(&issue_req.message_to_sign("tx-issue").unwrap())
        .unwrap();
    issue_req.signatures.push(signature);
    validator.verify_request(&issue_req, "tx-issue", &[]).unwrap();

    // Alice pays bob and carol.
    let (sender, spent) = spend(&pp, &alice, &issued, &issued_meta);
    let (transfer, out_meta) = sender
        .generate_zk_transfer(&[260, 20], &[bob.id(), carol.id()], &mut rng)
        .unwrap();
    let mut req = TokenRequest {
        transfers: vec![transfer.serialize().unwrap()],
        ..Default::default()
    };
    let md = TokenRequestMetadata {
        issues: vec![],
        transfers: vec![transfer_metadata(&alice, &[&bob, &carol], 2, &out_meta)],
    };
    let on_ledger = vec![held(&spent)];
    let ledger = vec![spent];
    req.auditor_signatures.push(auditor.audit(&req, &md, &ledger, "tx-1").unwrap());
    req.signatures = sender
        .sign_token_actions(&req.signed_content().unwrap(), "tx-1")
        .unwrap();
    validator.verify_request(&req, "tx-1", &on_ledger).unwrap();

    // A different anchor invalidates every signature.
    assert!(matches!(
        validator.verify_request(&req, "tx-2", &on_ledger),
        Err(ValidationError::InvalidSignature { index: 0, .. })
    ));
}

#[test]
fn audit_rejects_altered_openings() {
    let mut rng = StdRng::seed_from_u64(10);
    let pp = params(32);
    let (issuer, alice, auditor_party) = (Party::new(1), Party::new(2), Party::new(5));
    let auditor = auditor(&pp, &auditor_party);
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[10, 20], &mut rng);
    let request = TokenRequest {
        issues: vec![issued.serialize().unwrap()],
        ..Default::default()
    };

    let honest = TokenRequestMetadata {
        issues: vec![issue_metadata(&issuer, &alice, &meta)],
        transfers: vec![],
    };
    auditor.check(&request, &honest, &[], "tx").unwrap();

    let alterations: [fn(&mut Metadata); 3] = [
        |m| m.token_type = "XYZ".into(),
        |m| m.value = Some(Fr::from(11u64)),
        |m| m.blinding_factor = Some(Fr::from(1u64)),
    ];
    for alter in alterations {
        let mut altered = meta.clone();
        alter(&mut altered[0]);
        let md = TokenRequestMetadata {
            issues: vec![issue_metadata(&issuer, &alice, &altered)],
            transfers: vec![],
        };
        let err = auditor.check(&request, &md, &[], "tx").unwrap_err();
        match err {
            AuditError::Issue { index: 0, source } => {
                assert!(matches!(*source, AuditError::CommitmentMismatch(0)))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(auditor.audit(&request, &md, &[], "tx").is_err());
    }
}

#[test]
fn audit_rejects_unlinked_owner() {
    let mut rng = StdRng::seed_from_u64(11);
    let pp = params(32);
    let (issuer, alice, mallory) = (Party::new(1), Party::new(2), Party::new(6));
    let auditor = auditor(&pp, &Party::new(5));
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[10], &mut rng);
    let request = TokenRequest {
        issues: vec![issued.serialize().unwrap()],
        ..Default::default()
    };

    let mut md = issue_metadata(&issuer, &alice, &meta);
    md.outputs[0].receivers[0].audit_info = mallory.auditable().audit_info;
    let md = TokenRequestMetadata {
        issues: vec![md],
        transfers: vec![],
    };
    let err = auditor.check(&request, &md, &[], "tx").unwrap_err();
    assert!(matches!(err, AuditError::Issue { index: 0, .. }));
}

#[test]
fn redemption_needs_an_authorised_issuer() {
    let mut rng = StdRng::seed_from_u64(12);
    let (issuer, alice) = (Party::new(1), Party::new(2));
    let mut pp = setup(32, b"issuer-public-key", CurveId::Bn254).unwrap();
    pp.add_issuer(issuer.id());
    let pp = Arc::new(pp);
    let (issued, meta) = issue_to(&pp, &issuer, &alice, &[50], &mut rng);
    let (sender, spent) = spend(&pp, &alice, &issued, &meta);

    let (mut action, _) = sender
        .generate_zk_transfer(&[30, 20], &[Identity::none(), alice.id()], &mut rng)
        .unwrap();
    let spent = held(&spent);
    let validator = Validator::new(pp.clone());
    assert!(matches!(
        validator.verify_transfer(&action.serialize().unwrap(), &spent),
        Err(ValidationError::Transfer(TransferError::MissingIssuer))
    ));

    action.issuer = Some(Party::new(9).id());
    assert!(matches!(
        validator.verify_transfer(&action.serialize().unwrap(), &spent),
        Err(ValidationError::UnauthorizedIssuer(_))
    ));

    action.issuer = Some(issuer.id());
    let back = validator.verify_transfer(&action.serialize().unwrap(), &spent).unwrap();
    assert!(back.is_redeem_at(0));
    assert_eq!(TransferAction::deserialize(&action.serialize().unwrap()).unwrap(), back);
}
