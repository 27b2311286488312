// src/models/signed_message.rs
//! Signed disclosure message data model.
//!
//! A [`SignedMessage`] carries one or more credential proofs plus the
//! disclosure groups selecting which of their attributes are presented.
//! Each credential proof holds two signatures:
//! - the issuer's signature over the credential contents and holder key
//! - the holder's signature over the session (message, nonce, context,
//!   timestamp) bound to that issuer signature

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A signed attribute-disclosure message as received on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignedMessage {
    /// The text the holder signed
    pub message: String,

    pub nonce: String,

    #[serde(default)]
    pub context: String,

    /// Signing time (Unix seconds)
    pub timestamp: i64,

    pub credentials: Vec<CredentialProof>,

    /// Disclosure groups, each a list of references into `credentials`
    pub disclosed: Vec<Vec<AttributeIndex>>,
}

/// A credential presented in a signed message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialProof {
    /// Qualified credential type (`scheme.issuer.credential`)
    pub credential_type: String,

    /// Counter of the issuer key that signed this credential
    pub key_counter: u32,

    pub issued_at: i64,
    pub expires_at: i64,

    /// Every attribute of the credential; `null` marks an empty attribute
    pub attributes: BTreeMap<String, Option<String>>,

    /// Base64 SEC1 public key of the holder
    pub holder_key: String,

    /// Base64 `r || s` signature by the issuer
    pub issuer_signature: String,

    /// Base64 `r || s` signature by the holder
    pub holder_signature: String,
}

/// Reference to one attribute of one presented credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttributeIndex {
    pub credential: usize,
    pub attribute: String,
}

/// Bytes the issuer signs: everything in the credential except signatures.
///
/// Field order is fixed by declaration order, attribute order by the
/// `BTreeMap`, so the encoding is canonical.
#[derive(Serialize, Debug)]
pub struct IssuedCredentialPayload<'a> {
    pub credential_type: &'a str,
    pub key_counter: u32,
    pub issued_at: i64,
    pub expires_at: i64,
    pub attributes: &'a BTreeMap<String, Option<String>>,
    pub holder_key: &'a str,
}

/// Bytes the holder signs for one presented credential.
#[derive(Serialize, Debug)]
pub struct SessionPayload<'a> {
    pub message: &'a str,
    pub nonce: &'a str,
    pub context: &'a str,
    pub timestamp: i64,
    pub issuer_signature: &'a str,
}

impl CredentialProof {
    pub fn issued_payload(&self) -> IssuedCredentialPayload<'_> {
        IssuedCredentialPayload {
            credential_type: &self.credential_type,
            key_counter: self.key_counter,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            attributes: &self.attributes,
            holder_key: &self.holder_key,
        }
    }

    /// Whether the credential was valid at the given time (Unix seconds).
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        self.issued_at <= timestamp && timestamp <= self.expires_at
    }
}

impl SignedMessage {
    pub fn session_payload<'a>(&'a self, credential: &'a CredentialProof) -> SessionPayload<'a> {
        SessionPayload {
            message: &self.message,
            nonce: &self.nonce,
            context: &self.context,
            timestamp: self.timestamp,
            issuer_signature: &credential.issuer_signature,
        }
    }
}
