// src/models/scheme.rs
//! Scheme description data model.
//!
//! A scheme is published as a single `scheme.json` document listing its
//! issuers, their public keys and the credential types they issue. The
//! scheme directory stores one such document per scheme.
//!
//! # Identifiers
//! - Scheme: `irma-demo`
//! - Issuer: `irma-demo.MijnOverheid`
//! - Credential type: `irma-demo.MijnOverheid.fullName`

use serde::{Deserialize, Serialize};

/// File name of a scheme description, both on disk and remotely.
pub const SCHEME_FILE: &str = "scheme.json";

/// Top-level scheme description.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SchemeDescription {
    /// Scheme identifier, equal to the name of its directory
    pub id: String,

    /// Base URL the scheme is updated from (`<url>/scheme.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Version of the description (Unix seconds); higher is newer
    pub timestamp: i64,

    #[serde(default)]
    pub issuers: Vec<IssuerDescription>,
}

/// An issuer inside a scheme.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IssuerDescription {
    /// Issuer identifier, local to the scheme
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Signing keys, distinguished by counter
    #[serde(default)]
    pub public_keys: Vec<IssuerPublicKey>,

    #[serde(default)]
    pub credentials: Vec<CredentialTypeDescription>,
}

/// An issuer verification key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IssuerPublicKey {
    pub counter: u32,

    /// Base64 encoded SEC1 secp256k1 public key
    pub key: String,

    /// Unix seconds after which signatures by this key are no longer accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// A credential type and the attributes it carries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialTypeDescription {
    /// Credential type identifier, local to the issuer
    pub id: String,
    pub attributes: Vec<String>,
}

impl SchemeDescription {
    /// Qualified issuer identifier (`scheme.issuer`).
    pub fn issuer_identifier(&self, issuer: &IssuerDescription) -> String {
        format!("{}.{}", self.id, issuer.id)
    }
}
