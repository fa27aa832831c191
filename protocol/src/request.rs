//! Token requests: the signed bundle submitted to the ledger, and the
//! metadata disclosed to the auditor alongside it.

use serde::{Deserialize, Serialize};

use crate::encoding::{self, EncodingError};
use crate::identity::AuditableIdentity;

/// Serialized issue and transfer actions plus the signatures over them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub issues: Vec<Vec<u8>>,
    pub transfers: Vec<Vec<u8>>,
    pub signatures: Vec<Vec<u8>>,
    pub auditor_signatures: Vec<Vec<u8>>,
}

#[derive(Serialize)]
struct SignedContent<'a> {
    issues: &'a [Vec<u8>],
    transfers: &'a [Vec<u8>],
}

impl TokenRequest {
    /// The actions without any signature.
    pub fn signed_content(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::encode_versioned(&SignedContent {
            issues: &self.issues,
            transfers: &self.transfers,
        })
    }

    /// Bytes every party signs: [`Self::signed_content`] followed by the
    /// transaction anchor.
    pub fn message_to_sign(&self, anchor: &str) -> Result<Vec<u8>, EncodingError> {
        let mut message = self.signed_content()?;
        message.extend_from_slice(anchor.as_bytes());
        Ok(message)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::encode_versioned(self)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, EncodingError> {
        encoding::decode_versioned(raw)
    }
}

/// Per-action disclosures, aligned index by index with [`TokenRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequestMetadata {
    pub issues: Vec<IssueMetadata>,
    pub transfers: Vec<TransferMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    pub issuer: AuditableIdentity,
    pub outputs: Vec<IssueOutputMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOutputMetadata {
    /// Serialized [`crate::token::Metadata`] opening the output.
    pub output_metadata: Vec<u8>,
    pub receivers: Vec<AuditableIdentity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMetadata {
    pub inputs: Vec<TransferInputMetadata>,
    pub outputs: Vec<TransferOutputMetadata>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInputMetadata {
    pub senders: Vec<AuditableIdentity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutputMetadata {
    /// Serialized [`crate::token::Metadata`] opening the output.
    pub output_metadata: Vec<u8>,
    pub output_audit_info: Vec<u8>,
}

impl TokenRequestMetadata {
    pub fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        encoding::encode_versioned(self)
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, EncodingError> {
        encoding::decode_versioned(raw)
    }
}
