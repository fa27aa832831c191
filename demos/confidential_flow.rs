//! Walkthrough of a confidential token lifecycle.
//!
//! Sets up BN254 public parameters, issues hidden tokens, transfers them,
//! has the auditor open and endorse every request, and finally runs the
//! ledger-side validator. Ends by showing an unbalanced transfer being
//! rejected.
//!
//! Run with:
//!   cargo run --example confidential_flow --release

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};

use zkatdlog::audit::Auditor;
use zkatdlog::identity::{AuditableIdentity, Ed25519Signer, EnrollmentMatcher, Identity, SigningIdentity};
use zkatdlog::issue::Issuer;
use zkatdlog::logging::{init_logging, LogFormat};
use zkatdlog::request::{
    IssueMetadata, IssueOutputMetadata, TokenRequest, TokenRequestMetadata, TransferInputMetadata,
    TransferMetadata, TransferOutputMetadata,
};
use zkatdlog::setup::{setup, CurveId};
use zkatdlog::token::{Token, TokenId, TypedToken};
use zkatdlog::transfer::{Sender, TransferVerifier};
use zkatdlog::validator::Validator;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const MAGENTA: &str = "\x1b[35m";
const WHITE: &str = "\x1b[37m";

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]====================================================={RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn auditable(id: &Identity) -> AuditableIdentity {
    AuditableIdentity {
        identity: id.clone(),
        audit_info: EnrollmentMatcher::audit_info_for(id),
    }
}

fn main() -> Result<()> {
    init_logging("warn", LogFormat::Pretty);
    let mut rng = StdRng::from_entropy();

    // -----------------------------------------------------------------------
    section(1, "Public parameters");
    // -----------------------------------------------------------------------
    let issuer_key = Arc::new(Ed25519Signer::from_seed(&[1u8; 32]));
    let auditor_key = Arc::new(Ed25519Signer::from_seed(&[2u8; 32]));
    let alice = Arc::new(Ed25519Signer::from_seed(&[3u8; 32]));
    let (bob, carol) = (Ed25519Signer::from_seed(&[4u8; 32]), Ed25519Signer::from_seed(&[5u8; 32]));

    let t = Instant::now();
    let mut pp = setup(32, b"demo-issuer-public-key", CurveId::Bn254).context("setup")?;
    pp.add_issuer(issuer_key.identity());
    pp.add_auditor(auditor_key.identity());
    pp.validate().context("validate parameters")?;
    let pp = Arc::new(pp);
    timing("setup", t.elapsed());
    info("curve", &pp.curve.to_string());
    info("range", &format!("[0, {}]", pp.max_token_value()));
    info("params hash", &hex::encode(pp.compute_hash()?));

    let auditor = Auditor::new(Some(auditor_key.clone() as Arc<dyn SigningIdentity>), pp.clone(), Arc::new(EnrollmentMatcher));
    let validator = Validator::new(pp.clone());

    // -----------------------------------------------------------------------
    section(2, "Issue 220 + 60 ABC to Alice");
    // -----------------------------------------------------------------------
    let issuer = Issuer::new("ABC", Some(issuer_key.clone() as Arc<dyn SigningIdentity>), pp.clone());
    let t = Instant::now();
    let (issued, issued_meta) =
        issuer.generate_zk_issue(&[220, 60], &[alice.identity(), alice.identity()], &mut rng)?;
    timing("issue proof", t.elapsed());

    let mut request = TokenRequest {
        issues: vec![issued.serialize()?],
        ..Default::default()
    };
    let metadata = TokenRequestMetadata {
        issues: vec![IssueMetadata {
            issuer: auditable(&issuer_key.identity()),
            outputs: issued_meta
                .iter()
                .map(|m| {
                    Ok(IssueOutputMetadata {
                        output_metadata: m.serialize()?,
                        receivers: vec![auditable(&alice.identity())],
                    })
                })
                .collect::<Result<_>>()?,
        }],
        transfers: vec![],
    };
    request.auditor_signatures.push(auditor.audit(&request, &metadata, &[], "tx-1")?);
    request.signatures.push(issuer.sign_token_actions(&request.message_to_sign("tx-1")?)?);
    validator.verify_request(&request, "tx-1", &[])?;
    success("issue audited, signed and validated");

    // -----------------------------------------------------------------------
    section(3, "Alice pays 260 to Bob and 20 to Carol");
    // -----------------------------------------------------------------------
    let spent: Vec<Token> = issued.outputs.iter().flatten().cloned().collect();
    let ids = vec![TokenId::new("tx-1", 0), TokenId::new("tx-1", 1)];
    let signer: Arc<dyn SigningIdentity> = alice.clone();
    let signers = vec![signer.clone(), signer];
    let sender = Sender::new(signers, spent.clone(), ids, issued_meta.clone(), pp.clone())?;

    let t = Instant::now();
    let (transfer, out_meta) =
        sender.generate_zk_transfer(&[260, 20], &[bob.identity(), carol.identity()], &mut rng)?;
    timing("transfer proof", t.elapsed());

    let mut request = TokenRequest {
        transfers: vec![transfer.serialize()?],
        ..Default::default()
    };
    let metadata = TokenRequestMetadata {
        issues: vec![],
        transfers: vec![TransferMetadata {
            inputs: vec![
                TransferInputMetadata {
                    senders: vec![auditable(&alice.identity())],
                };
                2
            ],
            outputs: vec![
                TransferOutputMetadata {
                    output_metadata: out_meta[0].serialize()?,
                    output_audit_info: auditable(&bob.identity()).audit_info,
                },
                TransferOutputMetadata {
                    output_metadata: out_meta[1].serialize()?,
                    output_audit_info: auditable(&carol.identity()).audit_info,
                },
            ],
        }],
    };
    let ledger = vec![spent.clone()];
    request.auditor_signatures.push(auditor.audit(&request, &metadata, &ledger, "tx-2")?);
    request.signatures = sender.sign_token_actions(&request.signed_content()?, "tx-2")?;
    let on_ledger: Vec<Vec<TypedToken>> = vec![spent.iter().cloned().map(TypedToken::from).collect()];
    validator.verify_request(&request, "tx-2", &on_ledger)?;
    success("transfer audited, signed and validated");

    for (i, (name, meta)) in ["Bob", "Carol"].iter().zip(&out_meta).enumerate() {
        let token = transfer.output(i).context("missing output")?;
        let clear = token.to_clear(meta, &pp)?;
        info(name, &format!("{} {} ({})", clear.value, clear.token_type, clear.quantity()));
    }

    // -----------------------------------------------------------------------
    section(4, "Alice tries to mint value out of thin air");
    // -----------------------------------------------------------------------
    let (cheat, _) = sender.generate_zk_transfer(&[300, 20], &[bob.identity(), carol.identity()], &mut rng)?;
    match TransferVerifier::new(&cheat.input_commitments()?, &cheat.output_commitments()?, &pp)
        .verify(&cheat.proof)
    {
        Ok(()) => anyhow::bail!("unbalanced transfer was accepted"),
        Err(e) => println!("{RED}  [REJECTED] {e}{RESET}"),
    }

    println!();
    success("done");
    Ok(())
}
