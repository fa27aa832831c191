// Proof benchmarks for confidential tokens.
//
// Covers Pedersen commitments, single range proofs, and full issue and
// transfer proving/verification at 32-bit and 64-bit precision.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ark_bn254::Fr;
use ark_std::rand::{rngs::StdRng, SeedableRng};

use zkatdlog::crypto::commit_token;
use zkatdlog::issue::{IssueProver, IssueVerifier};
use zkatdlog::setup::{setup, CurveId, PublicParams};
use zkatdlog::token::get_tokens_with_witness;
use zkatdlog::transfer::{TransferProver, TransferVerifier};

fn params(bits: u64) -> PublicParams {
    setup(bits, b"bench-issuer", CurveId::Bn254).unwrap()
}

fn bench_pedersen_commit(c: &mut Criterion) {
    let pp = params(32);
    let bf = Fr::from(123_456u64);
    c.bench_function("zkp/pedersen_commit", |b| {
        b.iter(|| commit_token("ABC", Fr::from(1_000_000u64), bf, &pp.pedersen_generators).unwrap());
    });
}

fn bench_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("zkp/issue");
    for bits in [32u64, 64] {
        let pp = params(bits);
        let mut rng = StdRng::seed_from_u64(42);
        let (coms, witnesses) =
            get_tokens_with_witness(&[10, 20], "ABC", &pp.pedersen_generators, &mut rng).unwrap();
        let proof = IssueProver::new(&witnesses, &coms, &pp)
            .prove(&mut rng)
            .unwrap()
            .serialize()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("prove", bits), &bits, |b, _| {
            b.iter(|| IssueProver::new(&witnesses, &coms, &pp).prove(&mut rng).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("verify", bits), &bits, |b, _| {
            b.iter(|| IssueVerifier::new(&coms, &pp).verify(&proof).unwrap());
        });
    }
    group.finish();
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("zkp/transfer");
    for bits in [32u64, 64] {
        let pp = params(bits);
        let mut rng = StdRng::seed_from_u64(42);
        let gens = &pp.pedersen_generators;
        let (inputs, in_w) = get_tokens_with_witness(&[220, 60], "ABC", gens, &mut rng).unwrap();
        let (outputs, out_w) = get_tokens_with_witness(&[260, 20], "ABC", gens, &mut rng).unwrap();
        let proof = TransferProver::new(&in_w, &out_w, &inputs, &outputs, &pp)
            .prove(&mut rng)
            .unwrap()
            .serialize()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("prove_2x2", bits), &bits, |b, _| {
            b.iter(|| {
                TransferProver::new(&in_w, &out_w, &inputs, &outputs, &pp)
                    .prove(&mut rng)
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("verify_2x2", bits), &bits, |b, _| {
            b.iter(|| TransferVerifier::new(&inputs, &outputs, &pp).verify(&proof).unwrap());
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_pedersen_commit, bench_issue, bench_transfer
}
criterion_main!(benches);
