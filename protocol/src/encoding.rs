//! # Wire Encoding
//!
//! Two codecs meet here:
//!
//! - **arkworks canonical** (compressed) for group elements, scalars, and
//!   whole proof structs. Proof structs derive `CanonicalSerialize`, so the
//!   struct field order *is* the wire order.
//! - **bincode** over serde for actions, tokens, metadata, and public
//!   parameters. Curve values inside those structs are embedded as their
//!   canonical bytes through [`ark_bytes`].
//!
//! Actions travel inside a versioned envelope. The version is checked
//! before the payload is decoded, so a future layout never gets
//! misinterpreted as the current one.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MAX_MESSAGE_SIZE, PROTOCOL_V1};

/// Errors from either codec.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("bincode encoding failed: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("canonical encoding failed: {0}")]
    Canonical(#[from] SerializationError),

    #[error("{0} trailing bytes after canonical value")]
    TrailingBytes(usize),

    #[error("invalid protocol version: expected [{expected}], got [{got}]")]
    InvalidProtocolVersion { expected: u32, got: u32 },

    #[error("unknown token type tag [{0}]")]
    UnknownTokenType(u8),
}

// ---------------------------------------------------------------------------
// Canonical (arkworks) bytes
// ---------------------------------------------------------------------------

/// Compressed canonical encoding of any arkworks value.
pub fn to_canonical_bytes<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut buf)?;
    Ok(buf)
}

/// Inverse of [`to_canonical_bytes`]. Points are checked to be on the
/// curve and in the prime-order subgroup; leftover input is an error.
pub fn from_canonical_bytes<T: CanonicalDeserialize>(raw: &[u8]) -> Result<T, EncodingError> {
    let mut reader = raw;
    let value = T::deserialize_compressed(&mut reader)?;
    if !reader.is_empty() {
        return Err(EncodingError::TrailingBytes(reader.len()));
    }
    Ok(value)
}

/// Serde adapter: `#[serde(with = "crate::encoding::ark_bytes")]`.
///
/// Binary formats get raw canonical bytes; human-readable formats (JSON)
/// get a hex string.
pub mod ark_bytes {
    use super::*;
    use serde::{de, ser, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CanonicalSerialize,
        S: Serializer,
    {
        let buf = to_canonical_bytes(value).map_err(ser::Error::custom)?;
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(buf))
        } else {
            serializer.serialize_bytes(&buf)
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: CanonicalDeserialize,
        D: Deserializer<'de>,
    {
        let buf = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?
        } else {
            <Vec<u8>>::deserialize(deserializer)?
        };
        from_canonical_bytes(&buf).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// bincode
// ---------------------------------------------------------------------------

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_SIZE)
        .reject_trailing_bytes()
}

/// Plain bincode encoding with the crate-wide size limit.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    Ok(codec().serialize(value)?)
}

/// Plain bincode decoding; trailing bytes are rejected.
pub fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, EncodingError> {
    Ok(codec().deserialize(raw)?)
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    payload: Vec<u8>,
}

/// Wrap `value` in a [`PROTOCOL_V1`] envelope.
pub fn encode_versioned<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    let payload = encode(value)?;
    encode(&Envelope {
        version: PROTOCOL_V1,
        payload,
    })
}

/// Open an envelope, refusing any version other than [`PROTOCOL_V1`].
pub fn decode_versioned<T: DeserializeOwned>(raw: &[u8]) -> Result<T, EncodingError> {
    let envelope: Envelope = decode(raw)?;
    if envelope.version != PROTOCOL_V1 {
        return Err(EncodingError::InvalidProtocolVersion {
            expected: PROTOCOL_V1,
            got: envelope.version,
        });
    }
    decode(&envelope.payload)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
