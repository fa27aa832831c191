// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ZKAT-DLOG — Confidential Tokens over BN254
//!
//! A token scheme where the ledger never sees what a token is or how much
//! it is worth. Every token is a Pedersen commitment
//!
//! ```text
//! data = H(type) * G_type + value * G_value + bf * G_blind
//! ```
//!
//! and every action carries a Fiat-Shamir proof that the hidden content
//! obeys the rules: issued outputs share one type, transfers preserve both
//! type and total value, and no output escapes `[0, 2^bitLength)`. An
//! auditor holding the disclosed openings can check everything in the
//! clear without weakening privacy for anyone else.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and the serde-loadable setup config.
//! - **crypto** — Hashing, hash-to-curve, transcripts, Pedersen commitments.
//! - **encoding** — Wire codecs: bincode envelopes and arkworks bytes.
//! - **identity** — Opaque identities plus the signer and matcher capabilities.
//! - **setup** — Public parameters: generators, range parameters, issuers.
//! - **token** — Tokens, openings (metadata), plaintext tokens, witnesses.
//! - **rp** — Bulletproofs-style range proofs with an inner-product argument.
//! - **issue** — Same-type proofs, issue actions, the issuer.
//! - **transfer** — Type-and-sum proofs, transfer actions, the sender.
//! - **audit** — Opening-based inspection of issues and transfers.
//! - **request** — Token requests and the metadata disclosed to auditors.
//! - **validator** — Ledger-side checks composed from all of the above.
//! - **logging** — `tracing` subscriber setup for binaries and tests.
//!
//! ## Design Philosophy
//!
//! 1. Every prover and verifier is a pure function of its inputs. The RNG
//!    is always passed in, so tests are reproducible and threads never
//!    share hidden state.
//! 2. Field order on the wire is field order in the transcript. Don't
//!    reorder proof structs.
//! 3. Witness material never reaches a log line.

pub mod audit;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod issue;
pub mod logging;
pub mod request;
pub mod rp;
pub mod setup;
pub mod token;
pub mod transfer;
pub mod validator;

pub use error::ProofError;
pub use identity::{Identity, InfoMatcher, SigningIdentity};
pub use setup::{CurveId, PublicParams};
pub use token::{Metadata, Token, TokenId};
